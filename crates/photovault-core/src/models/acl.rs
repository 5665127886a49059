//! Access-control policy attached to a registered object.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::object::{Permission, PrincipalId, Visibility};

/// Fine-grained grant of one permission to one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AclRule {
    #[schema(value_type = String)]
    pub principal: PrincipalId,
    pub permission: Permission,
}

/// Owner plus visibility, optionally widened by explicit rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AclPolicy {
    #[schema(value_type = String)]
    pub owner: PrincipalId,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AclRule>,
}

impl AclPolicy {
    pub fn new(owner: PrincipalId, visibility: Visibility) -> Self {
        Self {
            owner,
            visibility,
            rules: Vec::new(),
        }
    }

    /// The access decision. Pure: depends only on the policy, the requester and
    /// the requested permission.
    ///
    /// | requester | visibility | permission | result |
    /// |---|---|---|---|
    /// | owner | any | any | allow |
    /// | other | public | read | allow |
    /// | other | public | write | deny |
    /// | other | private | any | deny |
    ///
    /// A rule naming the requester allows whatever its permission covers.
    pub fn allows(&self, requester: &PrincipalId, permission: Permission) -> bool {
        if &self.owner == requester {
            return true;
        }
        if self.visibility == Visibility::Public && permission == Permission::Read {
            return true;
        }
        self.rules
            .iter()
            .any(|rule| &rule.principal == requester && rule.permission.covers(permission))
    }

    /// Whether re-attaching with these terms would be a no-op.
    pub fn has_terms(&self, owner: &PrincipalId, visibility: Visibility) -> bool {
        &self.owner == owner && self.visibility == visibility
    }

    /// Add a rule unless an identical one is already present.
    pub fn add_rule(&mut self, rule: AclRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Drop every rule naming `principal`. Returns how many were removed.
    pub fn remove_rules_for(&mut self, principal: &PrincipalId) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| &rule.principal != principal);
        before - self.rules.len()
    }
}

use std::fmt;

use crate::types::Role;

/// Roles a route admits, fixed at registration time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RouteRequirement {
    // None = any authenticated user; otherwise a bitset over `Role`
    allowed: Option<u8>,
}

impl RouteRequirement {
    pub const fn any() -> Self {
        Self { allowed: None }
    }

    pub fn role(role: Role) -> Self {
        Self::roles([role])
    }

    /// Admit exactly the listed roles. An empty list admits nobody.
    pub fn roles<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        let mask = roles.into_iter().fold(0u8, |mask, role| mask | bit(role));
        Self { allowed: Some(mask) }
    }

    pub fn is_any(&self) -> bool {
        self.allowed.is_none()
    }

    pub fn allows(&self, role: Role) -> bool {
        match self.allowed {
            None => true,
            Some(mask) => mask & bit(role) != 0,
        }
    }

    pub fn allowed_roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.allows(*r)).collect()
    }
}

impl Default for RouteRequirement {
    fn default() -> Self {
        Self::any()
    }
}

impl From<Role> for RouteRequirement {
    fn from(role: Role) -> Self {
        Self::role(role)
    }
}

impl<const N: usize> From<[Role; N]> for RouteRequirement {
    fn from(roles: [Role; N]) -> Self {
        Self::roles(roles)
    }
}

impl fmt::Debug for RouteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            f.write_str("RouteRequirement(any)")
        } else {
            f.debug_tuple("RouteRequirement").field(&self.allowed_roles()).finish()
        }
    }
}

fn bit(role: Role) -> u8 {
    match role {
        Role::Customer => 0b001,
        Role::Vendor => 0b010,
        Role::Admin => 0b100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_admits_every_role() {
        let req = RouteRequirement::any();
        for role in Role::ALL {
            assert!(req.allows(role), "{} should be allowed", role);
        }
    }

    #[test]
    fn vendor_or_admin_denies_customer() {
        let req = RouteRequirement::from([Role::Vendor, Role::Admin]);
        assert!(!req.allows(Role::Customer));
        assert!(req.allows(Role::Vendor));
        assert!(req.allows(Role::Admin));
    }

    #[test]
    fn no_role_hierarchy() {
        let vendor_only = RouteRequirement::from(Role::Vendor);
        assert!(!vendor_only.allows(Role::Admin));

        let admin_only = RouteRequirement::from(Role::Admin);
        assert!(!admin_only.allows(Role::Vendor));
        assert!(!admin_only.allows(Role::Customer));
    }

    #[test]
    fn empty_set_admits_nobody() {
        let req = RouteRequirement::roles(Vec::<Role>::new());
        assert!(!req.is_any());
        assert!(Role::ALL.iter().all(|r| !req.allows(*r)));
    }

    #[test]
    fn debug_lists_roles() {
        let req = RouteRequirement::from([Role::Admin, Role::Vendor]);
        assert_eq!(format!("{:?}", req), "RouteRequirement([Vendor, Admin])");
    }
}

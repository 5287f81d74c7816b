//! Role flags held by a user.
//!
//! Roles are independent: a user may hold any combination of them. They are
//! stored as a bitmask in [`RoleSet`] so that filtering is a membership test.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// A single role flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coordinator,
    Instructor,
    PuStaff,
    Proofreader,
}

impl Role {
    /// All roles in badge display order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Coordinator,
        Role::Instructor,
        Role::PuStaff,
        Role::Proofreader,
    ];

    /// Value used in query strings, forms and as the storage column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
            Role::Instructor => "instructor",
            Role::PuStaff => "pu_staff",
            Role::Proofreader => "proofreader",
        }
    }

    /// Human-readable badge label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Coordinator => "Coordinator",
            Role::Instructor => "Instructor",
            Role::PuStaff => "PU Staff",
            Role::Proofreader => "Proofreader",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::single("role", format!("unknown role '{s}'")))
    }
}

/// Set of roles, stored as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    pub fn set(&mut self, role: Role, enabled: bool) {
        if enabled {
            self.insert(role);
        } else {
            self.remove(role);
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the held roles in [`Role::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|role| self.contains(*role))
    }

    /// Badge labels for every held role.
    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(Role::label).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

//! # Grant Graph
//!
//! A grant `(role, given_to, inherit)` gives `role` to the principal
//! `given_to`. The grant table is loaded whole and split into two adjacency
//! maps keyed by `given_to`:
//!
//! - `grants`: every granted role;
//! - `links`: only the roles granted with `inherit = true`.
//!
//! ## Closure
//!
//! For a login `u` with principal `$u`:
//!
//! ```text
//! roles = {$u} ∪ grants[$u]
//! loop:
//!     next = roles ∪ { g | r ∈ roles, l ∈ links[r], g ∈ grants[l] }
//!     if next == roles: break
//!     roles = next
//! ```
//!
//! An inheritable link `r → l` pulls in everything granted to `l`, whatever
//! the flags on those onward grants. A non-inheritable grant is visible only
//! where its holder's grants are pulled in. The graph may contain cycles; the
//! loop ends on the first pass that adds nothing, because the set only grows
//! and is bounded by the roles present in the table.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::login::Login;
use crate::roles::RoleSet;

/// One row of the grant table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    /// The granted role.
    pub role: String,
    /// The principal receiving the role (`$login` or a role name).
    pub given_to: String,
    /// Whether holders of `given_to` also receive `role`'s own grants.
    pub inherit: bool,
}

impl Grant {
    /// Build a grant row.
    pub fn new(role: impl Into<String>, given_to: impl Into<String>, inherit: bool) -> Self {
        Self {
            role: role.into(),
            given_to: given_to.into(),
            inherit,
        }
    }
}

/// Adjacency maps built from a full grant table snapshot.
#[derive(Debug, Clone, Default)]
pub struct GrantGraph {
    grants: HashMap<String, BTreeSet<String>>,
    links: HashMap<String, BTreeSet<String>>,
}

impl GrantGraph {
    /// Build the `grants` and `links` maps from grant rows.
    pub fn from_grants<'a>(rows: impl IntoIterator<Item = &'a Grant>) -> Self {
        let mut graph = Self::default();
        for row in rows {
            graph
                .grants
                .entry(row.given_to.clone())
                .or_default()
                .insert(row.role.clone());
            if row.inherit {
                graph
                    .links
                    .entry(row.given_to.clone())
                    .or_default()
                    .insert(row.role.clone());
            }
        }
        graph
    }

    /// Roles granted directly to `principal`.
    pub fn granted_to(&self, principal: &str) -> impl Iterator<Item = &str> {
        self.grants
            .get(principal)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Roles granted to `principal` with `inherit = true`.
    pub fn linked_from(&self, principal: &str) -> impl Iterator<Item = &str> {
        self.links
            .get(principal)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Compute the fixed-point role set for `login`.
    pub fn closure(&self, login: &Login) -> RoleSet {
        let principal = login.principal();
        let mut roles: BTreeSet<String> = self.granted_to(&principal).map(str::to_owned).collect();
        roles.insert(principal);

        loop {
            let mut next = roles.clone();
            for role in &roles {
                for linked in self.linked_from(role) {
                    next.extend(self.granted_to(linked).map(str::to_owned));
                }
            }
            if next == roles {
                break;
            }
            roles = next;
        }

        roles.into_iter().collect()
    }
}

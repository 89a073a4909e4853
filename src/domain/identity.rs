//! Boundary to the external identity registry.
//!
//! User records, roles and organisational reference data live outside this
//! service. The admission core only asks whether an opaque token refers to a
//! known student, teacher or cathedra.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{CathedraId, StudentId, TeacherId};

/// Role-specific payload of a registry user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    /// A student, optionally attached to an academic group.
    Student {
        /// Academic group key, if known.
        group_id: Option<i64>,
    },
    /// A teacher who may open advisor polls.
    Teacher {
        /// Academic position, e.g. "Associate Professor".
        position: Option<String>,
        /// Free-form research description.
        description: Option<String>,
    },
}

/// A registry user: shared person fields plus a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Registry key of the user.
    pub user_id: i64,
    /// Contact e-mail.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Patronymic, when the user has one.
    pub patronymic: Option<String>,
    /// Role and its payload.
    #[serde(flatten)]
    pub role: Role,
}

impl Identity {
    /// Returns `"Last First"` followed by the patronymic when present.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut full_name = format!("{} {}", self.last_name, self.first_name);
        if let Some(patronymic) = &self.patronymic {
            full_name.push(' ');
            full_name.push_str(patronymic);
        }
        full_name.trim().to_string()
    }

    /// Returns `true` for student identities.
    #[must_use]
    pub const fn is_student(&self) -> bool {
        matches!(self.role, Role::Student { .. })
    }

    /// Returns `true` for teacher identities.
    #[must_use]
    pub const fn is_teacher(&self) -> bool {
        matches!(self.role, Role::Teacher { .. })
    }
}

/// Existence checks the admission core needs from the identity registry.
pub trait IdentityRegistry: Send + Sync + std::fmt::Debug {
    /// Returns `true` if the token names a known student.
    fn student_exists(&self, id: StudentId) -> bool;
    /// Returns `true` if the token names a known teacher.
    fn teacher_exists(&self, id: TeacherId) -> bool;
    /// Returns `true` if the token names a known cathedra.
    fn cathedra_exists(&self, id: CathedraId) -> bool;
}

/// Registry that accepts every token as valid.
///
/// Used when identities are validated upstream and reach this service
/// already authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingRegistry;

impl IdentityRegistry for TrustingRegistry {
    fn student_exists(&self, _id: StudentId) -> bool {
        true
    }

    fn teacher_exists(&self, _id: TeacherId) -> bool {
        true
    }

    fn cathedra_exists(&self, _id: CathedraId) -> bool {
        true
    }
}

/// Fixed in-memory registry built from [`Identity`] records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityRegistry {
    users: HashMap<i64, Identity>,
    cathedras: HashSet<CathedraId>,
}

impl InMemoryIdentityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, replacing any previous record with the same key.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.users.insert(identity.user_id, identity);
        self
    }

    /// Adds a cathedra token.
    #[must_use]
    pub fn with_cathedra(mut self, id: CathedraId) -> Self {
        self.cathedras.insert(id);
        self
    }
}

impl IdentityRegistry for InMemoryIdentityRegistry {
    fn student_exists(&self, id: StudentId) -> bool {
        self.users.get(&id.get()).is_some_and(Identity::is_student)
    }

    fn teacher_exists(&self, id: TeacherId) -> bool {
        self.users.get(&id.get()).is_some_and(Identity::is_teacher)
    }

    fn cathedra_exists(&self, id: CathedraId) -> bool {
        self.cathedras.contains(&id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn student(user_id: i64, patronymic: Option<&str>) -> Identity {
        Identity {
            user_id,
            email: "olena@example.edu".to_string(),
            first_name: "Olena".to_string(),
            last_name: "Kovalenko".to_string(),
            patronymic: patronymic.map(str::to_string),
            role: Role::Student { group_id: Some(4) },
        }
    }

    fn teacher(user_id: i64) -> Identity {
        Identity {
            user_id,
            email: "petro@example.edu".to_string(),
            first_name: "Petro".to_string(),
            last_name: "Shevchuk".to_string(),
            patronymic: None,
            role: Role::Teacher {
                position: Some("Docent".to_string()),
                description: None,
            },
        }
    }

    #[test]
    fn full_name_appends_patronymic() {
        assert_eq!(student(1, None).full_name(), "Kovalenko Olena");
        assert_eq!(
            student(1, Some("Ivanivna")).full_name(),
            "Kovalenko Olena Ivanivna"
        );
    }

    #[test]
    fn registry_checks_role_of_token() {
        let registry = InMemoryIdentityRegistry::new()
            .with_identity(student(1, None))
            .with_identity(teacher(2))
            .with_cathedra(CathedraId::new(10));

        assert!(registry.student_exists(StudentId::new(1)));
        assert!(!registry.student_exists(StudentId::new(2)));
        assert!(registry.teacher_exists(TeacherId::new(2)));
        assert!(!registry.teacher_exists(TeacherId::new(1)));
        assert!(registry.cathedra_exists(CathedraId::new(10)));
        assert!(!registry.cathedra_exists(CathedraId::new(11)));
        assert!(!registry.student_exists(StudentId::new(99)));
    }

    #[test]
    fn trusting_registry_accepts_everything() {
        let registry = TrustingRegistry;
        assert!(registry.student_exists(StudentId::new(-1)));
        assert!(registry.teacher_exists(TeacherId::new(0)));
        assert!(registry.cathedra_exists(CathedraId::new(i64::MAX)));
    }

    #[test]
    fn role_is_flattened_into_identity_json() {
        let Ok(value) = serde_json::to_value(teacher(2)) else {
            panic!("serialization failed");
        };
        assert_eq!(value["role"], "teacher");
        assert_eq!(value["position"], "Docent");
    }
}

//! Use classifier: syntactic role of a type reference to [`ApiUse`].

use crate::compat::types::ApiUse;
use crate::error::{ImpactError, Result};
use crate::model::Role;

/// Fixed role table. Any role not listed is an error: a type reference in an
/// unknown position means the node taxonomy and this table disagree.
pub fn classify(role: Role) -> Result<ApiUse> {
    match role {
        Role::AccessedType
        | Role::ArgumentType
        | Role::BoundingType
        | Role::Cast
        | Role::DeclaringType
        | Role::MultiType
        | Role::Thrown
        | Role::Type
        | Role::TypeArgument
        | Role::TypeRef
        | Role::DeclaredTypeRef => Ok(ApiUse::TypeDependency),
        Role::SuperType => Ok(ApiUse::Extends),
        Role::Interface => Ok(ApiUse::Implements),
        Role::AnnotationType => Ok(ApiUse::Annotation),
        Role::Import => Ok(ApiUse::Import),
        other => Err(ImpactError::UnmanagedRole(format!("{other:?}"))),
    }
}

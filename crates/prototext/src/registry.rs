//! Type lookup for extensions and `Any` payloads.

use std::sync::OnceLock;

use thiserror::Error;

use crate::descriptor::{DescriptorPool, FieldDescriptor, MessageDescriptor};

/// Lookup failure. [`ResolverError::NotFound`] is the distinguished
/// non-fatal case: the decoder treats it as "unresolved" and falls back to
/// unknown-field handling, while any other error aborts the parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Failed(String),
}

/// Resolves message types by URL and extension fields by name or number.
///
/// Implementations must be safe for concurrent read-only lookup; a single
/// resolver may serve many decoders at once.
pub trait Resolver {
    fn find_message_by_url(&self, url: &str) -> Result<MessageDescriptor, ResolverError>;

    fn find_extension_by_name(&self, full_name: &str) -> Result<FieldDescriptor, ResolverError>;

    fn find_extension_by_number(
        &self,
        extendee: &str,
        number: u32,
    ) -> Result<FieldDescriptor, ResolverError>;
}

/// A [`Resolver`] backed by one or more descriptor pools.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    pools: Vec<DescriptorPool>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    pub fn with_pool(pool: DescriptorPool) -> Self {
        TypeRegistry { pools: vec![pool] }
    }

    pub fn register_pool(&mut self, pool: DescriptorPool) {
        self.pools.push(pool);
    }
}

impl Resolver for TypeRegistry {
    fn find_message_by_url(&self, url: &str) -> Result<MessageDescriptor, ResolverError> {
        // The message full name is the last `/`-delimited segment; a bare
        // full name is accepted as-is.
        let full_name = url.rsplit('/').next().unwrap_or(url);
        self.pools
            .iter()
            .find_map(|p| p.message_by_name(full_name))
            .ok_or(ResolverError::NotFound)
    }

    fn find_extension_by_name(&self, full_name: &str) -> Result<FieldDescriptor, ResolverError> {
        self.pools
            .iter()
            .find_map(|p| p.extension_by_name(full_name))
            .ok_or(ResolverError::NotFound)
    }

    fn find_extension_by_number(
        &self,
        extendee: &str,
        number: u32,
    ) -> Result<FieldDescriptor, ResolverError> {
        self.pools
            .iter()
            .find_map(|p| p.extension_by_number(extendee, number))
            .ok_or(ResolverError::NotFound)
    }
}

/// The process-wide default registry, used when
/// [`UnmarshalOptions`](crate::UnmarshalOptions) carries no resolver. It is
/// empty: a dynamic-only crate has no generated types to pre-register, so
/// callers with extensions or `Any` fields pass their own registry.
pub fn global_registry() -> &'static TypeRegistry {
    static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
    GLOBAL.get_or_init(TypeRegistry::new)
}

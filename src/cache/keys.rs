//! Cache Key Helpers
//!
//! Keys follow the `resource:id` convention, with `resource:all` naming a
//! resource's collection view.

/// Build a cache key for one entity.
///
/// # Example
///
/// ```
/// use viewcache::cache::keys::resource_key;
///
/// assert_eq!(resource_key("clients", "123"), "clients:123");
/// ```
pub fn resource_key(resource: &str, id: &str) -> String {
    format!("{}:{}", resource, id)
}

/// Build the cache key for a resource's collection view.
///
/// # Example
///
/// ```
/// use viewcache::cache::keys::resource_all;
///
/// assert_eq!(resource_all("projects"), "projects:all");
/// ```
pub fn resource_all(resource: &str) -> String {
    format!("{}:all", resource)
}

/// Extract the resource prefix from a cache key.
///
/// # Example
///
/// ```
/// use viewcache::cache::keys::resource_of;
///
/// assert_eq!(resource_of("clients:123"), Some("clients"));
/// assert_eq!(resource_of("plain"), None);
/// ```
pub fn resource_of(key: &str) -> Option<&str> {
    let (resource, rest) = key.split_once(':')?;
    if resource.is_empty() || rest.is_empty() {
        return None;
    }
    Some(resource)
}

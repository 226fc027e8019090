//! Storage key resolution.

use std::borrow::Cow;

use super::{PreferencesConfig, Scope};

/// Prefix shared by every preferences key.
pub const KEY_PREFIX: &str = "datatable";

/// Resolves the storage key for a table.
///
/// Precedence is user > org > global: a user-scoped config without a usable
/// user key falls back to the org key, then to the global key. Blank keys
/// count as missing. `%` and `:` inside the user key, org key and table id
/// are percent-encoded, so distinct configs never share a key.
///
/// ```
/// use datatable_lib::preferences::{PreferencesConfig, Scope, resolve_key};
///
/// let config = PreferencesConfig::new("users").with_scope(Scope::User).with_user_key("42");
/// assert_eq!(resolve_key(&config), "datatable:user:42:users");
/// ```
pub fn resolve_key(config: &PreferencesConfig) -> String {
    let user = usable(config.user_key.as_deref());
    let org = usable(config.org_key.as_deref());

    let id = escape(&config.id);

    match (config.scope, user, org) {
        (Scope::User, Some(user), _) => format!("{KEY_PREFIX}:user:{}:{id}", escape(user)),
        (Scope::User | Scope::Org, _, Some(org)) => format!("{KEY_PREFIX}:org:{}:{id}", escape(org)),
        _ => format!("{KEY_PREFIX}:global:{id}"),
    }
}

fn escape(component: &str) -> Cow<'_, str> {
    if !component.contains([':', '%']) {
        return Cow::Borrowed(component);
    }
    let mut escaped = String::with_capacity(component.len() + 4);
    for c in component.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn usable(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_scope_precedence() {
        let config = PreferencesConfig::new("loans")
            .with_scope(Scope::User)
            .with_user_key("u1")
            .with_org_key("o1");
        assert_eq!(resolve_key(&config), "datatable:user:u1:loans");
    }

    #[test]
    fn test_blank_keys_degrade() {
        let config = PreferencesConfig::new("loans")
            .with_scope(Scope::User)
            .with_user_key("  ")
            .with_org_key("o1");
        assert_eq!(resolve_key(&config), "datatable:org:o1:loans");

        let config = PreferencesConfig::new("loans").with_scope(Scope::User);
        assert_eq!(resolve_key(&config), "datatable:global:loans");

        let config = PreferencesConfig::new("loans").with_scope(Scope::Org).with_org_key("");
        assert_eq!(resolve_key(&config), "datatable:global:loans");
    }

    #[test]
    fn test_global_ignores_identity_keys() {
        let config = PreferencesConfig::new("loans").with_user_key("u1").with_org_key("o1");
        assert_eq!(resolve_key(&config), "datatable:global:loans");
    }

    #[test]
    fn test_separators_inside_components_do_not_collide() {
        let split_user = PreferencesConfig::new("c").with_scope(Scope::User).with_user_key("a:b");
        let split_id = PreferencesConfig::new("b:c").with_scope(Scope::User).with_user_key("a");
        assert_eq!(resolve_key(&split_user), "datatable:user:a%3Ab:c");
        assert_eq!(resolve_key(&split_id), "datatable:user:a:b%3Ac");

        let literal = PreferencesConfig::new("x%3Ay");
        let encoded = PreferencesConfig::new("x:y");
        assert_ne!(resolve_key(&literal), resolve_key(&encoded));
        assert_eq!(resolve_key(&literal), "datatable:global:x%253Ay");
    }

    #[test]
    fn test_org_scope_ignores_user_key() {
        let config = PreferencesConfig::new("loans")
            .with_scope(Scope::Org)
            .with_user_key("u1")
            .with_org_key("o1");
        assert_eq!(resolve_key(&config), "datatable:org:o1:loans");
    }
}

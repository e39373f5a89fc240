//! Identifier casing for values keys

/// Characters treated as word separators in Kubernetes names
const SEPARATORS: [char; 5] = ['-', '_', '.', ' ', '/'];

/// Convert a Kubernetes-style name into a lowerCamelCase values key
///
/// `controller-manager` becomes `controllerManager`, `db_host` becomes
/// `dbHost`. Existing inner capitals are kept.
#[must_use]
pub fn to_lower_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = false;

    for c in s.chars() {
        if SEPARATORS.contains(&c) {
            upper_next = !result.is_empty();
            continue;
        }
        if result.is_empty() {
            result.extend(c.to_lowercase());
        } else if upper_next {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        upper_next = false;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab() {
        assert_eq!(to_lower_camel("controller-manager"), "controllerManager");
        assert_eq!(to_lower_camel("kube-rbac-proxy"), "kubeRbacProxy");
    }

    #[test]
    fn test_snake_and_dots() {
        assert_eq!(to_lower_camel("db_host"), "dbHost");
        assert_eq!(to_lower_camel("app.properties"), "appProperties");
    }

    #[test]
    fn test_leading_separator_and_capitals() {
        assert_eq!(to_lower_camel("-web"), "web");
        assert_eq!(to_lower_camel("MyApp"), "myApp");
        assert_eq!(to_lower_camel("manager"), "manager");
        assert_eq!(to_lower_camel(""), "");
    }
}

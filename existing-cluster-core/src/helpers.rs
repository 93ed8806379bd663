use std::any::type_name;

use kube::Resource;

pub fn pretty_type_name<'a, T>() -> &'a str {
    type_name::<T>().split("::").last().unwrap_or_default()
}

pub trait AndIf<F> {
    fn and_if(self, condition: bool, then: F) -> Self;
}

impl<T, F> AndIf<F> for T
where
    F: FnOnce(Self) -> Self,
{
    fn and_if(self, condition: bool, then: F) -> Self {
        let mut obj = self;
        if condition {
            obj = then(obj);
        }

        obj
    }
}

pub trait RequireMetadata<E> {
    fn require_name_or(&self, error: E) -> Result<&str, E>;
    fn require_namespace_or(&self, error: E) -> Result<&str, E>;
    fn require_uid_or(&self, error: E) -> Result<&str, E>;
}

impl<T: Resource, E> RequireMetadata<E> for T {
    fn require_name_or(&self, error: E) -> Result<&str, E> {
        Ok(self.meta().name.as_ref().ok_or(error)?.as_str())
    }

    fn require_namespace_or(&self, error: E) -> Result<&str, E> {
        Ok(self.meta().namespace.as_ref().ok_or(error)?.as_str())
    }

    fn require_uid_or(&self, error: E) -> Result<&str, E> {
        Ok(self.meta().uid.as_ref().ok_or(error)?.as_str())
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Secret;
    use kube::core::ObjectMeta;

    use super::{pretty_type_name, AndIf, RequireMetadata};

    #[test]
    fn pretty_type_name_strips_module_path() {
        assert_eq!(pretty_type_name::<Secret>(), "Secret");
    }

    #[test]
    fn and_if_only_applies_when_condition_holds() {
        assert_eq!(1.and_if(true, |v| v + 1), 2);
        assert_eq!(1.and_if(false, |v| v + 1), 1);
    }

    #[test]
    fn require_metadata_reports_missing_fields() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(secret.require_name_or("missing"), Ok("creds"));
        assert_eq!(secret.require_namespace_or("missing"), Err("missing"));
        assert_eq!(secret.require_uid_or("missing"), Err("missing"));
    }
}

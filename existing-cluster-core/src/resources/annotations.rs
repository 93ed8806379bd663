use kube::Resource;

pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";
pub const DEFAULT_CLASS_ANNOTATION: &str = "resourceclass.crossplane.io/is-default-class";

pub fn get_external_name<T: Resource>(object: &T) -> Option<&str> {
    object
        .meta()
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(EXTERNAL_NAME_ANNOTATION))
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

pub fn set_external_name<T: Resource>(object: &mut T, name: &str) {
    object
        .meta_mut()
        .annotations
        .get_or_insert_with(Default::default)
        .insert(EXTERNAL_NAME_ANNOTATION.to_owned(), name.to_owned());
}

pub fn is_default_class<T: Resource>(object: &T) -> bool {
    object
        .meta()
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(DEFAULT_CLASS_ANNOTATION))
        .map(|value| value == "true")
        .unwrap_or(false)
}

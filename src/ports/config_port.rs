//! Configuration access port trait.

pub trait ConfigPort {
    /// Trimmed value of `key`, or `None` if absent or blank.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Keys present in `section`, sorted. Empty if the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;
}

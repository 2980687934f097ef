//! Package plus input-glob combinations, the unit of file hashing.

/// Separator between the package name and the input patterns in a key.
const PACKAGE_SEPARATOR: char = '#';
/// Separator between input patterns in a key.
const INPUT_SEPARATOR: &str = "!";
/// Escapes a separator or itself inside a pattern.
const ESCAPE: char = '\\';

/// A package together with the input patterns one or more of its tasks read.
///
/// Patterns are kept sorted, so specs built from the same pattern set in any
/// order compare equal and share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageFileSpec {
    package: String,
    inputs: Vec<String>,
}

impl PackageFileSpec {
    /// Create a spec, normalizing the order of `inputs`.
    pub fn new(package: impl Into<String>, inputs: &[String]) -> Self {
        let mut inputs = inputs.to_vec();
        inputs.sort();
        Self {
            package: package.into(),
            inputs,
        }
    }

    /// Package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Sorted input patterns.
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Key under which the spec's file hash is stored: `pkg#in1!in2`.
    ///
    /// `!` and `\` inside a pattern are escaped with `\`, and an empty
    /// pattern is written as a lone `\`, so distinct specs never share a key.
    #[must_use]
    pub fn to_key(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(|p| escape_pattern(p)).collect();
        format!(
            "{}{PACKAGE_SEPARATOR}{}",
            self.package,
            inputs.join(INPUT_SEPARATOR)
        )
    }
}

fn escape_pattern(pattern: &str) -> String {
    if pattern.is_empty() {
        return ESCAPE.to_string();
    }
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == ESCAPE || INPUT_SEPARATOR.starts_with(c) {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn key_without_inputs() {
        assert_eq!(PackageFileSpec::new("pkg-a", &[]).to_key(), "pkg-a#");
    }

    #[test]
    fn input_order_does_not_matter() {
        let ab = PackageFileSpec::new("pkg", &strings(&["a", "b"]));
        let ba = PackageFileSpec::new("pkg", &strings(&["b", "a"]));

        assert_eq!(ab.to_key(), "pkg#a!b");
        assert_eq!(ab.to_key(), ba.to_key());

        let set: BTreeSet<_> = [ab, ba].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn separators_inside_patterns_are_escaped() {
        let split = PackageFileSpec::new("a", &strings(&["x.ts", "y.ts"]));
        let joined = PackageFileSpec::new("a", &strings(&["x.ts!y.ts"]));

        assert_eq!(split.to_key(), "a#x.ts!y.ts");
        assert_eq!(joined.to_key(), r"a#x.ts\!y.ts");
        assert_eq!(
            PackageFileSpec::new("a", &strings(&[r"x\", "y"])).to_key(),
            r"a#x\\!y"
        );
    }

    #[test]
    fn empty_pattern_differs_from_no_patterns() {
        assert_eq!(PackageFileSpec::new("a", &strings(&[""])).to_key(), r"a#\");
        assert_ne!(
            PackageFileSpec::new("a", &strings(&[""])).to_key(),
            PackageFileSpec::new("a", &[]).to_key()
        );
    }

    #[test]
    fn packages_are_distinguished() {
        let a = PackageFileSpec::new("a", &strings(&["src/**"]));
        let b = PackageFileSpec::new("b", &strings(&["src/**"]));
        assert_ne!(a.to_key(), b.to_key());
        assert_eq!(a.inputs(), ["src/**".to_string()]);
        assert_eq!(a.package(), "a");
    }
}

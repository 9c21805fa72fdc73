use std::collections::HashSet;
use std::path::Path;

/// Name-based denylist for console commands.
///
/// Names are matched case-insensitively against the program token and
/// against its final path component, so a forbidden `rm` also blocks
/// `/bin/rm` and `RM`.
///
/// # Examples
///
/// ```
/// use hostwatch_sandbox::CommandPolicy;
///
/// let policy = CommandPolicy::new(["rm", " Shutdown ", ""]);
/// assert_eq!(policy.forbidden_match("/usr/bin/rm").as_deref(), Some("rm"));
/// assert!(policy.forbidden_match("SHUTDOWN").is_some());
/// assert!(policy.forbidden_match("ls").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandPolicy {
    forbidden: HashSet<String>,
}

impl CommandPolicy {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forbidden = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { forbidden }
    }

    /// Returns the denylist entry `program` matches, if any.
    pub fn forbidden_match(&self, program: &str) -> Option<String> {
        let folded = program.to_lowercase();
        if self.forbidden.contains(&folded) {
            return Some(folded);
        }

        let base = Path::new(&folded).file_name()?.to_str()?;
        self.forbidden.contains(base).then(|| base.to_string())
    }

    pub fn len(&self) -> usize {
        self.forbidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
    }
}

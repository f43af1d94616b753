//! Lock-string access check trait.

use protoforge_types::object::Caller;

/// Evaluates lock strings such as `spawn:all(); edit:id(5) or perm(Admin)`.
pub trait LockChecker: Send + Sync {
    /// Whether `caller` passes the `access_type` lock in `lockstring`.
    fn check(&self, caller: &Caller, lockstring: &str, access_type: &str) -> bool;

    /// Check a lock string for syntax errors without evaluating it.
    fn validate(&self, lockstring: &str) -> Result<(), String>;
}

/// Default lock string given to a prototype saved without one.
pub fn default_prototype_locks(caller: &Caller) -> String {
    format!("spawn:all(); edit:id({}) or perm(Admin)", caller.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prototype_locks_names_caller() {
        let caller = Caller::new(12, "Builder");
        assert_eq!(
            default_prototype_locks(&caller),
            "spawn:all(); edit:id(12) or perm(Admin)"
        );
    }
}

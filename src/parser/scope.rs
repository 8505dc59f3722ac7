//! Lexical scopes that track which router variables carry a path prefix.
//!
//! `api := r.PathPrefix("/api").Subrouter()` binds `api` to `/api` in the
//! current block. Inner blocks see outer bindings, and a re-declaration in an
//! inner block shadows the outer one until that block closes.

use std::collections::HashMap;

#[derive(Debug)]
pub struct PrefixScopes {
    frames: Vec<HashMap<String, String>>,
}

impl Default for PrefixScopes {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixScopes {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Close the innermost scope. The file scope is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Declare `name` in the innermost scope (`:=`, `var`, parameters).
    pub fn bind(&mut self, name: &str, prefix: String) {
        if name == "_" {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), prefix);
        }
    }

    /// Plain assignment (`=`): update the nearest declaration, or declare at
    /// file scope when the variable was never seen (package-level router).
    pub fn assign(&mut self, name: &str, prefix: String) {
        if name == "_" {
            return;
        }
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = prefix;
                return;
            }
        }
        if let Some(root) = self.frames.first_mut() {
            root.insert(name.to_string(), prefix);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.get(name))
            .map(String::as_str)
    }

    /// Prefix for a receiver expression; unknown receivers have none.
    pub fn prefix_of(&self, name: &str) -> String {
        self.lookup(name).unwrap_or("").to_string()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_pop() {
        let mut scopes = PrefixScopes::new();
        scopes.bind("api", "/api".into());
        scopes.push();
        scopes.bind("api", "/v2".into());
        assert_eq!(scopes.prefix_of("api"), "/v2");
        scopes.pop();
        assert_eq!(scopes.prefix_of("api"), "/api");
    }

    #[test]
    fn test_root_never_popped() {
        let mut scopes = PrefixScopes::new();
        scopes.pop();
        scopes.pop();
        assert_eq!(scopes.depth(), 1);
        scopes.bind("r", String::new());
        assert_eq!(scopes.lookup("r"), Some(""));
    }

    #[test]
    fn test_assign_updates_outer() {
        let mut scopes = PrefixScopes::new();
        scopes.bind("g", "/a".into());
        scopes.push();
        scopes.assign("g", "/b".into());
        scopes.pop();
        assert_eq!(scopes.prefix_of("g"), "/b");

        scopes.push();
        scopes.assign("fresh", "/c".into());
        scopes.pop();
        assert_eq!(scopes.prefix_of("fresh"), "/c");
        assert_eq!(scopes.prefix_of("unknown"), "");
    }

    #[test]
    fn test_blank_identifier_ignored() {
        let mut scopes = PrefixScopes::new();
        scopes.bind("_", "/x".into());
        assert_eq!(scopes.lookup("_"), None);
    }
}

use std::time::{Duration, Instant};

use log::{log, Level};

/// The hierarchy of scopes, and the time consumed by each one. Useful for profiling
/// the slower post-processing passes (dominator computation, fault catalogue
/// generation, CNF encoding) without threading a profiler through every call site.
pub struct TimingTree {
    name: String,
    level: Level,
    enter_time: Instant,
    exit_time: Option<Instant>,
    children: Vec<TimingTree>,
}

impl Default for TimingTree {
    fn default() -> Self {
        TimingTree::new("root", Level::Debug)
    }
}

impl TimingTree {
    pub fn new(name: &str, level: Level) -> Self {
        Self {
            name: name.to_string(),
            level,
            enter_time: Instant::now(),
            exit_time: None,
            children: vec![],
        }
    }

    fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Start a new child scope, returning its index so `pop` can be called for it.
    pub fn push(&mut self, name: &str, level: Level) {
        assert!(self.is_open(), "cannot push onto a closed TimingTree scope");
        if let Some(last) = self.children.last_mut() {
            if last.is_open() {
                last.push(name, level);
                return;
            }
        }
        self.children.push(TimingTree::new(name, level));
    }

    /// Close the innermost open scope.
    pub fn pop(&mut self) {
        if let Some(last) = self.children.last_mut() {
            if last.is_open() {
                if last.children.last().map_or(false, |c| c.is_open()) {
                    last.pop();
                    return;
                }
                last.exit_time = Some(Instant::now());
                return;
            }
        }
        self.exit_time = Some(Instant::now());
    }

    fn duration(&self) -> Duration {
        self.exit_time
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.enter_time)
    }

    /// Emit this tree (and its children) through the `log` facade.
    pub fn print(&self) {
        self.print_at_depth(0);
    }

    fn print_at_depth(&self, depth: usize) {
        let indent = "| ".repeat(depth);
        log!(
            self.level,
            "{}{} ({:.4}s)",
            indent,
            self.name,
            self.duration().as_secs_f64()
        );
        for child in &self.children {
            child.print_at_depth(depth + 1);
        }
    }
}

/// Runs `f`, recording its duration as a child scope of `tree` under `name`.
pub fn timed<R>(tree: &mut TimingTree, name: &str, level: Level, f: impl FnOnce() -> R) -> R {
    tree.push(name, level);
    let r = f();
    tree.pop();
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_close_innermost_first() {
        let mut tree = TimingTree::default();
        timed(&mut tree, "outer", Level::Debug, || {
            timed(&mut tree, "inner", Level::Debug, || {
                std::thread::sleep(Duration::from_millis(1));
            });
        });
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
        assert!(!tree.children[0].is_open());
        assert!(!tree.children[0].children[0].is_open());
    }
}

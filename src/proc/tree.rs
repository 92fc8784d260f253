// src/proc/tree.rs

//! Process-tree discovery.
//!
//! A kill decision and the kill itself are separated by enough time for the
//! tree to change, so the descendant set is recomputed from a fresh process
//! listing on every call, never cached.

use std::collections::{HashMap, HashSet, VecDeque};
use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;

use tracing::debug;

/// Run a command on a helper thread, bounded by `limit`.
///
/// Returns `None` when the command fails, exits nonzero, or does not
/// complete in time (the helper thread is left to finish on its own).
pub(crate) fn run_bounded(program: &str, args: &[&str], limit: Duration) -> Option<String> {
    let program = program.to_string();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let output = Command::new(&program).args(&args).output();
        let _ = tx.send(output);
    });

    match rx.recv_timeout(limit) {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Ok(output)) => {
            debug!(status = ?output.status.code(), "process listing command failed");
            None
        }
        Ok(Err(e)) => {
            debug!(error = %e, "process listing command could not be started");
            None
        }
        Err(_) => {
            debug!(limit = ?limit, "process listing command did not complete in time");
            None
        }
    }
}

/// Enumerate `root` plus all its descendants.
///
/// Queries the process table via `ps -eo pid=,ppid=`, bounded by
/// `ps_timeout`. Any failure degrades to just the root pid, so the caller's
/// kill always proceeds with at least the process it knows about.
pub fn descendants(root: u32, ps_timeout: Duration) -> Vec<u32> {
    let Some(listing) = run_bounded("ps", &["-eo", "pid=,ppid="], ps_timeout) else {
        return vec![root];
    };
    let children = parse_listing(&listing);
    collect_tree(root, &children)
}

/// Parse `pid ppid` pairs into a parent -> children adjacency map.
///
/// Unparsable lines are skipped; garbage input yields an empty map.
fn parse_listing(listing: &str) -> HashMap<u32, Vec<u32>> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid), Some(ppid)) = (fields.next(), fields.next()) else {
            continue;
        };
        let (Ok(pid), Ok(ppid)) = (pid.parse::<u32>(), ppid.parse::<u32>()) else {
            continue;
        };
        children.entry(ppid).or_default().push(pid);
    }
    children
}

/// Breadth-first walk from `root` over the adjacency map.
///
/// The visited set guards against pid-reuse artifacts in the listing that
/// could otherwise form a cycle.
fn collect_tree(root: u32, children: &HashMap<u32, Vec<u32>>) -> Vec<u32> {
    let mut collected = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(pid) = queue.pop_front() {
        if !visited.insert(pid) {
            continue;
        }
        collected.push(pid);
        if let Some(kids) = children.get(&pid) {
            queue.extend(kids.iter().copied());
        }
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pid_ppid_pairs() {
        let listing = "    1     0\n  100     1\n  200   100\n  300   100\n";
        let children = parse_listing(listing);
        assert_eq!(children[&1], vec![100]);
        assert_eq!(children[&100], vec![200, 300]);
    }

    #[test]
    fn skips_garbage_lines() {
        let listing = "not a pid\n100 1\nxyz 100\n100\n";
        let children = parse_listing(listing);
        assert_eq!(children.len(), 1);
        assert_eq!(children[&1], vec![100]);
    }

    #[test]
    fn collects_root_and_all_descendants() {
        let listing = "100 1\n200 100\n300 200\n400 100\n999 1\n";
        let children = parse_listing(listing);
        let mut tree = collect_tree(100, &children);
        tree.sort_unstable();
        assert_eq!(tree, vec![100, 200, 300, 400]);
    }

    #[test]
    fn unknown_root_yields_just_the_root() {
        let children = parse_listing("100 1\n");
        assert_eq!(collect_tree(555, &children), vec![555]);
    }

    #[test]
    fn cycle_in_listing_does_not_hang() {
        // pid reuse can make the listing claim a descendant is also an
        // ancestor; the visited set must terminate the walk.
        let listing = "200 100\n100 200\n";
        let children = parse_listing(listing);
        let mut tree = collect_tree(100, &children);
        tree.sort_unstable();
        assert_eq!(tree, vec![100, 200]);
    }

    #[test]
    fn real_listing_contains_self() {
        let pid = std::process::id();
        let tree = descendants(pid, Duration::from_secs(2));
        assert!(tree.contains(&pid));
    }
}

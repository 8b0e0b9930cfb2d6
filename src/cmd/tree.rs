//! Hierarchical command tree
//!
//! Containers group commands under a name (`show`, `configure`, ...);
//! leaves carry the action that runs when a line resolves to them.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use super::args::Args;
use crate::core::session::Session;
use crate::error::{CommandError, TreeError};

/// Callback bound to a leaf command
pub type Action = Box<dyn Fn(&mut Session, &Args) -> anyhow::Result<()>>;

/// A node of the command tree
pub enum Node {
    Container(Container),
    Leaf(Leaf),
}

impl Node {
    pub fn help(&self) -> &str {
        match self {
            Node::Container(c) => &c.help,
            Node::Leaf(l) => &l.help,
        }
    }
}

/// Group of named child commands
#[derive(Default)]
pub struct Container {
    help: String,
    children: BTreeMap<String, Node>,
}

/// Executable command
pub struct Leaf {
    help: String,
    action: Action,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Container(c) => c.fmt(f),
            Node::Leaf(l) => l.fmt(f),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("help", &self.help)
            .field("children", &self.children)
            .finish()
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf").field("help", &self.help).finish_non_exhaustive()
    }
}

/// Names are non-empty printable ASCII, the only bytes a client can type
fn check_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Container {
    pub fn new(help: impl Into<String>) -> Self {
        Self {
            help: help.into(),
            children: BTreeMap::new(),
        }
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Get or create the child group `name`
    pub fn container(
        &mut self,
        name: &str,
        help: impl Into<String>,
    ) -> Result<&mut Container, TreeError> {
        check_name(name)?;
        let node = self
            .children
            .entry(name.to_string())
            .or_insert_with(|| Node::Container(Container::new(help)));
        match node {
            Node::Container(c) => Ok(c),
            Node::Leaf(_) => Err(TreeError::NotAContainer(name.to_string())),
        }
    }

    /// Attach an executable command
    pub fn leaf<F>(
        &mut self,
        name: &str,
        help: impl Into<String>,
        action: F,
    ) -> Result<&mut Container, TreeError>
    where
        F: Fn(&mut Session, &Args) -> anyhow::Result<()> + 'static,
    {
        check_name(name)?;
        if self.children.contains_key(name) {
            return Err(TreeError::Duplicate(name.to_string()));
        }
        self.children.insert(
            name.to_string(),
            Node::Leaf(Leaf {
                help: help.into(),
                action: Box::new(action),
            }),
        );
        Ok(self)
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Children in name order with their help text
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node.help()))
    }

    /// Child names starting with `prefix`, in name order
    pub fn names_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.children
            .keys()
            .filter(move |name| name.starts_with(prefix))
            .map(String::as_str)
    }
}

impl Leaf {
    pub fn help(&self) -> &str {
        &self.help
    }
}

/// Outcome of resolving a token list
#[derive(Debug)]
pub enum Resolution<'t> {
    /// Nothing was typed
    NoCommand,
    /// Reached a leaf; the remaining tokens are its arguments
    Leaf {
        leaf: &'t Leaf,
        path: Vec<String>,
        args: Args,
    },
    /// Tokens ran out on a container
    Incomplete(&'t Container),
    /// `token` is not a child of the container reached so far
    NotFound(String),
}

/// Outcome of tab completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Exactly one child matches; holds its full name
    Unique(String),
    /// Several children match, in name order
    Candidates(Vec<String>),
    NoMatch,
}

/// Command tree rooted at an unnamed container
#[derive(Debug, Default)]
pub struct CommandTree {
    root: Container,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    /// Registration entry point
    pub fn root_mut(&mut self) -> &mut Container {
        &mut self.root
    }

    /// Container found by following `path` from the root
    pub fn node_at(&self, path: &[String]) -> Option<&Container> {
        let mut current = &self.root;
        for name in path {
            match current.child(name)? {
                Node::Container(c) => current = c,
                Node::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    /// Walk `tokens` from `start` by exact name match
    pub fn resolve<'t>(&self, start: &'t Container, tokens: &[String]) -> Resolution<'t> {
        if tokens.is_empty() {
            return Resolution::NoCommand;
        }

        let mut current = start;
        for (i, token) in tokens.iter().enumerate() {
            match current.child(token) {
                Some(Node::Container(c)) => current = c,
                Some(Node::Leaf(leaf)) => {
                    return Resolution::Leaf {
                        leaf,
                        path: tokens[..=i].to_vec(),
                        args: Args::from(tokens[i + 1..].to_vec()),
                    };
                }
                None => return Resolution::NotFound(token.clone()),
            }
        }
        Resolution::Incomplete(current)
    }

    /// Complete the last of `tokens` against the container the others lead to
    pub fn complete(&self, start: &Container, tokens: &[String]) -> Completion {
        let Some((partial, path)) = tokens.split_last() else {
            return Completion::NoMatch;
        };

        let mut current = start;
        for token in path {
            match current.child(token) {
                Some(Node::Container(c)) => current = c,
                // Arguments of a leaf, or an unknown word
                _ => return Completion::NoMatch,
            }
        }

        let mut matches: Vec<String> = current
            .names_with_prefix(partial)
            .map(str::to_string)
            .collect();
        match matches.len() {
            0 => Completion::NoMatch,
            1 => Completion::Unique(matches.remove(0)),
            _ => Completion::Candidates(matches),
        }
    }

    /// Run a leaf, turning errors and panics into `CommandError::Failed`
    pub fn execute(&self, leaf: &Leaf, session: &mut Session, args: &Args) -> Result<(), CommandError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (leaf.action)(session, args))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CommandError::Failed(format!("{:#}", e))),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "command panicked".to_string());
                Err(CommandError::Failed(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{CaptureSink, SessionId};

    fn tokens(line: &str) -> Vec<String> {
        Args::tokenize(line).to_vec()
    }

    fn sample_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        let root = tree.root_mut();
        root.container("show", "Show running system information")
            .unwrap()
            .leaf("version", "Show version", |s, _| {
                s.write_line("v1");
                Ok(())
            })
            .unwrap()
            .leaf("vlan", "Show vlans", |_, _| Ok(()))
            .unwrap()
            .leaf("history", "Show history", |_, _| Ok(()))
            .unwrap();
        root.leaf("ping", "Send echo requests", |_, args| {
            anyhow::ensure!(!args.is_empty(), "missing host");
            Ok(())
        })
        .unwrap();
        root.leaf("crash", "Panics", |_, _| panic!("boom")).unwrap();
        tree
    }

    #[test]
    fn test_resolve_leaf_with_args() {
        let tree = sample_tree();
        match tree.resolve(tree.root(), &tokens("show version extra")) {
            Resolution::Leaf { leaf, path, args } => {
                assert_eq!(leaf.help(), "Show version");
                assert_eq!(path, vec!["show", "version"]);
                assert_eq!(args.to_vec(), vec!["extra"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_failures() {
        let tree = sample_tree();
        assert!(matches!(tree.resolve(tree.root(), &[]), Resolution::NoCommand));
        assert!(matches!(
            tree.resolve(tree.root(), &tokens("show")),
            Resolution::Incomplete(_)
        ));
        match tree.resolve(tree.root(), &tokens("show ver")) {
            Resolution::NotFound(token) => assert_eq!(token, "ver"),
            other => panic!("unexpected {:?}", other),
        }
        // Case-sensitive
        assert!(matches!(
            tree.resolve(tree.root(), &tokens("SHOW version")),
            Resolution::NotFound(_)
        ));
    }

    #[test]
    fn test_complete() {
        let tree = sample_tree();
        let root = tree.root();
        assert_eq!(
            tree.complete(root, &tokens("show ver")),
            Completion::Unique("version".to_string())
        );
        assert_eq!(
            tree.complete(root, &tokens("show v")),
            Completion::Candidates(vec!["version".to_string(), "vlan".to_string()])
        );
        assert_eq!(tree.complete(root, &tokens("show x")), Completion::NoMatch);
        assert_eq!(tree.complete(root, &tokens("ping ho")), Completion::NoMatch);
        assert_eq!(
            tree.complete(root, &["show".to_string(), String::new()]),
            Completion::Candidates(vec![
                "history".to_string(),
                "version".to_string(),
                "vlan".to_string()
            ])
        );
    }

    #[test]
    fn test_registration_errors() {
        let mut tree = sample_tree();
        let root = tree.root_mut();
        assert_eq!(
            root.leaf("ping", "again", |_, _| Ok(())).unwrap_err(),
            TreeError::Duplicate("ping".to_string())
        );
        assert_eq!(
            root.container("ping", "group").unwrap_err(),
            TreeError::NotAContainer("ping".to_string())
        );
        assert_eq!(
            root.leaf("two words", "bad", |_, _| Ok(())).unwrap_err(),
            TreeError::InvalidName("two words".to_string())
        );
        assert_eq!(
            root.leaf("café", "bad", |_, _| Ok(())).unwrap_err(),
            TreeError::InvalidName("café".to_string())
        );
        assert_eq!(
            root.container("tab\x07", "bad").unwrap_err(),
            TreeError::InvalidName("tab\x07".to_string())
        );
        // Existing groups are reused
        assert!(root.container("show", "ignored").is_ok());
        assert_eq!(tree.root().entries().count(), 3);
    }

    #[test]
    fn test_node_at() {
        let tree = sample_tree();
        assert!(tree.node_at(&[]).is_some());
        assert!(tree.node_at(&["show".to_string()]).is_some());
        assert!(tree.node_at(&["ping".to_string()]).is_none());
        assert!(tree.node_at(&["nope".to_string()]).is_none());
    }

    #[test]
    fn test_execute_catches_failures() {
        let tree = sample_tree();
        let sink = CaptureSink::new();
        let mut session = Session::new(SessionId(1), Box::new(sink.clone()));

        let Resolution::Leaf { leaf, args, .. } = tree.resolve(tree.root(), &tokens("show version"))
        else {
            panic!("expected leaf");
        };
        assert!(tree.execute(leaf, &mut session, &args).is_ok());
        assert_eq!(sink.take(), b"v1\r\n");

        let Resolution::Leaf { leaf, args, .. } = tree.resolve(tree.root(), &tokens("ping")) else {
            panic!("expected leaf");
        };
        let err = tree.execute(leaf, &mut session, &args).unwrap_err();
        assert_eq!(err.to_string(), "Error: missing host");

        let Resolution::Leaf { leaf, args, .. } = tree.resolve(tree.root(), &tokens("crash")) else {
            panic!("expected leaf");
        };
        let err = tree.execute(leaf, &mut session, &args).unwrap_err();
        assert_eq!(err.to_string(), "Error: boom");
    }
}

//! Hands a form's context to the field coordinators below it in a view tree.
//!
//! The view layer implements [`FormNode`] for its node type; this module only
//! walks the tree.

use crate::form::FormContext;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeRole {
    /// Rendered as-is; never receives a context.
    Plain,
    /// Field coordinator that needs the enclosing form's context.
    Coordinator,
}

pub enum Children<'a> {
    None,
    Nodes(&'a mut [Box<dyn FormNode>]),
    /// Produced by a render function; opaque to injection.
    Deferred,
}

pub trait FormNode {
    fn role(&self) -> NodeRole;

    fn attach(&mut self, context: FormContext);

    fn children(&mut self) -> Children<'_>;
}

/// Attaches `context` to every coordinator reachable through concrete children.
/// Returns how many coordinators were attached.
pub fn provide_form_context(nodes: &mut [Box<dyn FormNode>], context: &FormContext) -> usize {
    let mut attached = 0;
    for node in nodes.iter_mut() {
        if let Children::Nodes(children) = node.children() {
            attached += provide_form_context(children, context);
        }
        if node.role() == NodeRole::Coordinator {
            node.attach(context.clone());
            attached += 1;
        }
    }
    attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormController, FormOptions};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Kind {
        Plain,
        Coordinator,
        Deferred,
    }

    struct TestNode {
        kind: Kind,
        children: Vec<Box<dyn FormNode>>,
        probe: Arc<AtomicUsize>,
    }

    impl FormNode for TestNode {
        fn role(&self) -> NodeRole {
            match self.kind {
                Kind::Coordinator => NodeRole::Coordinator,
                _ => NodeRole::Plain,
            }
        }

        fn attach(&mut self, _context: FormContext) {
            self.probe.fetch_add(1, Ordering::SeqCst);
        }

        fn children(&mut self) -> Children<'_> {
            match self.kind {
                Kind::Deferred => Children::Deferred,
                _ if self.children.is_empty() => Children::None,
                _ => Children::Nodes(&mut self.children),
            }
        }
    }

    fn node(
        kind: Kind,
        children: Vec<Box<dyn FormNode>>,
        probe: &Arc<AtomicUsize>,
    ) -> Box<dyn FormNode> {
        Box::new(TestNode {
            kind,
            children,
            probe: probe.clone(),
        })
    }

    #[test]
    fn coordinators_receive_context_and_deferred_children_are_skipped() {
        let probe = Arc::new(AtomicUsize::new(0));
        let hidden = node(Kind::Coordinator, Vec::new(), &probe);
        let mut tree = vec![
            node(
                Kind::Plain,
                vec![
                    node(Kind::Coordinator, Vec::new(), &probe),
                    node(
                        Kind::Plain,
                        vec![node(Kind::Coordinator, Vec::new(), &probe)],
                        &probe,
                    ),
                ],
                &probe,
            ),
            node(Kind::Deferred, vec![hidden], &probe),
            node(Kind::Plain, Vec::new(), &probe),
        ];

        let form = FormController::new(FormOptions::default());
        let attached = provide_form_context(&mut tree, &form.context());

        assert_eq!(attached, 2);
        assert_eq!(probe.load(Ordering::SeqCst), 2);
    }
}

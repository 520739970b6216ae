mod common;

use common::*;
use nodecanvas::document::GraphDocument;
use nodecanvas::history::History;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    AddNode,
    Noop,
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::AddNode),
        1 => Just(Op::Noop),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn run_op(history: &mut History, op: &Op, counter: &mut usize) {
    match op {
        Op::AddNode => {
            *counter += 1;
            let id = format!("n{counter}");
            history.set_with_history(|doc| {
                let mut next = doc.clone();
                next.add_node(text_prompt(&id));
                next
            });
        }
        Op::Noop => history.set_with_history(|doc| doc.clone()),
        Op::Undo => {
            history.undo();
        }
        Op::Redo => {
            history.redo();
        }
    }
}

proptest! {
    #[test]
    fn past_depth_never_exceeds_the_limit(
        ops in prop::collection::vec(op_strategy(), 1..120),
        limit in 1usize..16,
    ) {
        let mut history = History::new(GraphDocument::new(), limit);
        let mut counter = 0;
        for op in &ops {
            run_op(&mut history, op, &mut counter);
            prop_assert!(history.depth() <= limit);
        }
    }

    #[test]
    fn undo_redo_are_inverse_at_any_point(
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut history = History::new(GraphDocument::new(), 100);
        let mut counter = 0;
        for op in &ops {
            run_op(&mut history, op, &mut counter);

            let present = history.present().clone();
            if history.undo() {
                prop_assert!(history.redo());
                prop_assert_eq!(history.present(), &present);
            }
            if history.redo() {
                prop_assert!(history.undo());
                prop_assert_eq!(history.present(), &present);
            }
        }
    }

    #[test]
    fn noop_updates_change_nothing(
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut history = History::new(GraphDocument::new(), 100);
        let mut counter = 0;
        for op in &ops {
            run_op(&mut history, op, &mut counter);
        }

        let present = history.present().clone();
        let depth = history.depth();
        let could_redo = history.can_redo();

        history.set_with_history(|doc| doc.clone());

        prop_assert_eq!(history.present(), &present);
        prop_assert_eq!(history.depth(), depth);
        prop_assert_eq!(history.can_redo(), could_redo);
    }

    #[test]
    fn undo_bottoms_out_without_losing_the_present(
        pushes in 1usize..30,
        limit in 1usize..10,
    ) {
        let mut history = History::new(GraphDocument::new(), limit);
        let mut counter = 0;
        for _ in 0..pushes {
            run_op(&mut history, &Op::AddNode, &mut counter);
        }

        let mut undos = 0;
        while history.undo() {
            undos += 1;
        }
        prop_assert_eq!(undos, pushes.min(limit));
        // Everything undone is redoable; nothing was lost along the way.
        for _ in 0..undos {
            prop_assert!(history.redo());
        }
        prop_assert_eq!(history.present().nodes.len(), pushes);
    }
}

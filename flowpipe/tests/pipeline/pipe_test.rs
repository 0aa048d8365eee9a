use std::sync::Arc;
use std::time::Duration;

use flowpipe::{just_promise, pipe, ChainItem, LifecycleEvent, PipelineError, Stage};

use crate::helpers::{settle_in, ManualStage};

fn names(stages: &[Arc<dyn Stage>]) -> Vec<String> {
    stages.iter().map(|s| s.name().to_string()).collect()
}

#[cfg(test)]
mod pipe_tests {
    use super::*;

    #[tokio::test]
    async fn it_should_resolve_with_stages_in_original_order() {
        // Given
        let a = ManualStage::readable("a");
        let b = ManualStage::duplex("b");
        let c = ManualStage::writable("c");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::Stage(b.clone()),
            ChainItem::Stage(c.clone()),
        ]));

        // When
        settle_in().await;
        a.emit(LifecycleEvent::End);
        b.emit(LifecycleEvent::End);
        c.emit(LifecycleEvent::Finish);
        let result = handle.await.unwrap();

        // Then
        assert_eq!(names(&result.unwrap()), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn it_should_link_each_adjacent_pair_in_order() {
        // Given
        let a = ManualStage::readable("a");
        let b = ManualStage::duplex("b");
        let c = ManualStage::writable("c");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::Stage(b.clone()),
            ChainItem::Stage(c.clone()),
        ]));

        // When
        settle_in().await;
        a.emit(LifecycleEvent::End);
        b.emit(LifecycleEvent::End);
        c.emit(LifecycleEvent::Finish);
        handle.await.unwrap().unwrap();

        // Then
        assert_eq!(a.linked_to(), vec!["b"]);
        assert_eq!(b.linked_to(), vec!["c"]);
        assert!(c.linked_to().is_empty());
    }

    #[tokio::test]
    async fn it_should_flatten_nested_groups_in_encounter_order() {
        // Given a chain shaped like [a, [b, c], d]
        let a = ManualStage::readable("a");
        let b = ManualStage::duplex("b");
        let c = ManualStage::duplex("c");
        let d = ManualStage::writable("d");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::group(vec![ChainItem::Stage(b.clone()), ChainItem::Stage(c.clone())]),
            ChainItem::Stage(d.clone()),
        ]));

        // When
        settle_in().await;
        for stage in [&a, &b, &c] {
            stage.emit(LifecycleEvent::End);
        }
        d.emit(LifecycleEvent::Finish);
        let result = handle.await.unwrap();

        // Then linking order is a→b→c→d and the resolution is flat
        assert_eq!(names(&result.unwrap()), vec!["a", "b", "c", "d"]);
        assert_eq!(a.linked_to(), vec!["b"]);
        assert_eq!(b.linked_to(), vec!["c"]);
        assert_eq!(c.linked_to(), vec!["d"]);
    }

    #[tokio::test]
    async fn it_should_reject_a_degenerate_pipeline() {
        // Given
        let only = ManualStage::readable("only");

        // When
        let one = pipe(vec![ChainItem::Stage(only.clone())]).await;
        let none = pipe(Vec::new()).await;

        // Then
        let Err(one_err) = one else {
            panic!("expected a configuration error");
        };
        assert_eq!(
            one_err.to_string(),
            "a pipeline needs at least two stages, got 1"
        );
        assert!(matches!(one_err, PipelineError::TooFewStages(1)));
        assert!(matches!(none, Err(PipelineError::TooFewStages(0))));
    }

    #[tokio::test]
    async fn it_should_reject_with_the_first_failure_by_arrival() {
        // Given
        let a = ManualStage::readable("a");
        let b = ManualStage::duplex("b");
        let c = ManualStage::writable("c");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::Stage(b.clone()),
            ChainItem::Stage(c.clone()),
        ]));

        // When two stages fail back to back
        settle_in().await;
        b.emit_error("bad_transform");
        tokio::time::sleep(Duration::from_millis(20)).await;
        c.emit_error("late");
        let result = handle.await.unwrap();

        // Then the earlier failure wins
        let Err(PipelineError::Stage(err)) = result else {
            panic!("expected a stage failure");
        };
        assert_eq!(err.stage().name(), "b");
        assert_eq!(err.message(), "bad_transform");
    }

    #[tokio::test]
    async fn it_should_break_same_tick_failure_ties_by_chain_order() {
        // Given two failures already queued before the trackers first run
        let a = ManualStage::readable("a");
        let b = ManualStage::writable("b");
        let promise = just_promise(vec![
            a.clone() as Arc<dyn Stage>,
            b.clone() as Arc<dyn Stage>,
        ]);
        b.emit_error("later in the chain");
        a.emit_error("earlier in the chain");

        // When both trackers become ready in the same tick
        let result = promise.await;

        // Then the earlier stage wins the tie
        let Err(PipelineError::Stage(err)) = result else {
            panic!("expected a stage failure");
        };
        assert_eq!(err.stage().name(), "a");
        assert_eq!(err.message(), "earlier in the chain");
    }

    #[tokio::test]
    async fn it_should_wait_for_every_stage_before_resolving() {
        // Given
        let a = ManualStage::readable("a");
        let b = ManualStage::writable("b");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::Stage(b.clone()),
        ]));

        // When only the first stage has completed
        settle_in().await;
        a.emit(LifecycleEvent::End);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let still_waiting = !handle.is_finished();
        b.emit(LifecycleEvent::Finish);
        let result = handle.await.unwrap();

        // Then
        assert!(still_waiting);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn it_should_pipe_through_a_terminal_sink_without_blocking() {
        // Given a sink that will never report termination
        let a = ManualStage::readable("a");
        let sink = ManualStage::terminal("stdout");
        let handle = tokio::spawn(pipe(vec![
            ChainItem::Stage(a.clone()),
            ChainItem::Stage(sink.clone()),
        ]));

        // When
        settle_in().await;
        a.emit(LifecycleEvent::End);
        let result = handle.await.unwrap();

        // Then
        assert_eq!(names(&result.unwrap()), vec!["a", "stdout"]);
    }

    #[tokio::test]
    async fn it_should_not_link_stages_in_just_promise() {
        // Given
        let a = ManualStage::readable("a");
        let b = ManualStage::writable("b");
        let handle = tokio::spawn(just_promise(vec![
            a.clone() as Arc<dyn Stage>,
            b.clone() as Arc<dyn Stage>,
        ]));

        // When
        settle_in().await;
        a.emit(LifecycleEvent::End);
        b.emit(LifecycleEvent::Finish);
        let result = handle.await.unwrap();

        // Then completion is tracked but no wiring happened
        assert!(result.is_ok());
        assert!(a.linked_to().is_empty());
        assert!(b.linked_to().is_empty());
    }

    #[tokio::test]
    async fn it_should_resolve_an_empty_just_promise_immediately() {
        // Given no stages at all
        let result = just_promise(Vec::<Arc<dyn Stage>>::new()).await;

        // Then
        assert!(result.unwrap().is_empty());
    }
}

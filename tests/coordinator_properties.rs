use busy_indicator::{IndicatorConfig, IndicatorPhase, VisibilityCoordinator};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Step {
    Begin,
    End,
    Wait(u64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Begin),
        3 => Just(Step::End),
        2 => (1u64..400).prop_map(Step::Wait),
    ]
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn check_phase(c: &VisibilityCoordinator) -> Result<(), TestCaseError> {
    let phase = c.phase();
    if c.pending_count() == 0 {
        prop_assert!(matches!(phase, IndicatorPhase::Idle | IndicatorPhase::AwaitingHide), "{phase:?}");
    } else {
        prop_assert!(
            matches!(phase, IndicatorPhase::AwaitingShow | IndicatorPhase::Visible),
            "{phase:?}"
        );
    }
    prop_assert_eq!(c.is_visible(), matches!(phase, IndicatorPhase::Visible | IndicatorPhase::AwaitingHide));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balanced_interleavings_settle_hidden(
        steps in prop::collection::vec(step(), 0..60),
        min_ms in 0u64..500,
        delay_ms in 0u64..300,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let c = VisibilityCoordinator::new(IndicatorConfig::new(
                Duration::from_millis(min_ms),
                Duration::from_millis(delay_ms),
            ))
            .unwrap();

            let mut open = 0usize;
            for s in steps {
                match s {
                    Step::Begin => {
                        c.begin();
                        open += 1;
                    }
                    // Only end what was begun so every end is matched.
                    Step::End if open > 0 => {
                        c.end();
                        open -= 1;
                    }
                    Step::End => {}
                    Step::Wait(ms) => advance(ms).await,
                }
                prop_assert_eq!(c.pending_count(), open);
                check_phase(&c)?;
            }
            for _ in 0..open {
                c.end();
            }

            advance(min_ms + delay_ms + 1).await;
            prop_assert_eq!(c.phase(), IndicatorPhase::Idle);
            prop_assert!(!c.is_visible());

            let m = c.metrics();
            prop_assert_eq!(m.begins, m.ends);
            prop_assert_eq!(m.unmatched_ends, 0);
            prop_assert_eq!(m.shows, m.hides);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn extra_ends_never_go_negative(extra in 1usize..10) {
        let rt = paused_runtime();
        rt.block_on(async {
            let c = VisibilityCoordinator::new(IndicatorConfig::default()).unwrap();
            for _ in 0..extra {
                c.end();
            }
            prop_assert_eq!(c.pending_count(), 0);
            prop_assert_eq!(c.metrics().unmatched_ends, extra as u64);

            c.begin();
            prop_assert_eq!(c.pending_count(), 1);
            prop_assert!(c.is_visible());
            Ok::<(), TestCaseError>(())
        })?;
    }
}

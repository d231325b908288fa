// ABOUTME: Tests for token limits - recording, nested scopes, sibling scopes
// ABOUTME: and shared limit updates.

use super::*;
use crate::error::LimitKind;
use crate::sample::SampleContext;
use crate::transcript::{Event, Transcript};

fn usage(total: u64) -> ModelUsage {
    ModelUsage::new(total, 0)
}

#[test]
fn test_no_active_limits() {
    record_model_usage(&usage(1_000));
    assert!(check_token_limit().is_ok());
}

#[test]
fn test_usage_addition() {
    let mut a = ModelUsage::new(3, 4);
    a += ModelUsage {
        reasoning_tokens: Some(2),
        ..ModelUsage::new(1, 1)
    };
    assert_eq!(a.total_tokens, 9);
    assert_eq!(a.input_tokens, 4);
    assert_eq!(a.reasoning_tokens, Some(2));
    assert_eq!(a.input_tokens_cache_read, None);
}

#[tokio::test]
async fn test_none_limit_is_unlimited() {
    token_limit(None)
        .scope(async {
            record_model_usage(&usage(u64::MAX / 2));
            assert!(check_token_limit().is_ok());
        })
        .await;
}

#[tokio::test]
async fn test_exceeding_limit() {
    let err = token_limit(Some(10))
        .scope(async {
            record_model_usage(&usage(10));
            check_token_limit()?;
            record_model_usage(&usage(1));
            check_token_limit()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, LimitKind::Token);
    assert_eq!(err.value, 11.0);
    assert_eq!(err.limit, 10.0);
}

#[tokio::test]
async fn test_usage_before_scope_not_counted() {
    let outer = token_limit(Some(100));
    outer
        .scope(async {
            record_model_usage(&usage(50));
            token_limit(Some(10))
                .scope(async {
                    record_model_usage(&usage(5));
                    assert!(check_token_limit().is_ok());
                })
                .await;
        })
        .await;
}

#[tokio::test]
async fn test_outer_limit_enforced_from_inner_scope() {
    let err = token_limit(Some(10))
        .scope(token_limit(Some(100)).scope(async {
            record_model_usage(&usage(20));
            check_token_limit()
        }))
        .await
        .unwrap_err();
    assert_eq!(err.limit, 10.0);
}

#[tokio::test]
async fn test_out_of_scope_limits_not_checked() {
    token_limit(Some(1)).scope(async {}).await;
    record_model_usage(&usage(10));
    assert!(check_token_limit().is_ok());
}

#[tokio::test]
async fn test_sibling_scopes_count_separately() {
    let parent = token_limit(Some(15));
    let child = token_limit(Some(10));

    let (a, b, after) = parent
        .scope(async {
            let (a, b) = tokio::join!(
                child.scope(async {
                    record_model_usage(&usage(8));
                    tokio::task::yield_now().await;
                    check_token_limit()
                }),
                child.scope(async {
                    record_model_usage(&usage(8));
                    tokio::task::yield_now().await;
                    check_token_limit()
                }),
            );
            (a, b, check_token_limit())
        })
        .await;

    // Each child used 8 of its own 10 but the parent saw 16 of 15.
    assert_eq!(a.unwrap_err().limit, 15.0);
    assert_eq!(b.unwrap_err().limit, 15.0);
    assert_eq!(after.unwrap_err().value, 16.0);
}

#[tokio::test]
async fn test_set_limit_updates_active_scopes() {
    let limit = token_limit(Some(100));
    let result = limit
        .scope(async {
            record_model_usage(&usage(50));
            assert!(check_token_limit().is_ok());
            limit.set_limit(Some(20));
            check_token_limit()
        })
        .await;
    assert!(result.is_err());
    assert_eq!(limit.limit(), Some(20));
}

#[tokio::test]
async fn test_spawned_tasks_do_not_inherit_scope() {
    token_limit(Some(1))
        .scope(async {
            let handle = tokio::spawn(async {
                record_model_usage(&usage(100));
                check_token_limit()
            });
            assert!(handle.await.unwrap().is_ok());
            assert!(check_token_limit().is_ok());
        })
        .await;
}

#[tokio::test]
async fn test_exceeding_records_sample_limit_event() {
    let transcript = Transcript::new();
    let _ = SampleContext::new("s")
        .with_transcript(transcript.clone())
        .run(token_limit(Some(1)).scope(async {
            record_model_usage(&usage(2));
            check_token_limit()
        }))
        .await;

    let events = transcript.events();
    assert_eq!(events.len(), 1);
    let Event::SampleLimit(event) = &events[0] else {
        panic!("expected sample limit event");
    };
    assert_eq!(event.kind, LimitKind::Token);
    assert_eq!(event.limit, Some(1.0));
    assert_eq!(event.message, "Token limit exceeded. value: 2; limit: 1");
}

use crate::core::models::{
    change::{Change, Row},
    vote::{anonymous_identity, Insert, Outcome, Query, Submit, Vote, Voter},
};
use crate::core::ports::notifier::Notifier;
use crate::core::ports::repository::{OptionCommon, Store, TxStore, VoteCommon};
use crate::core::services::poll::get as get_poll;
use crate::core::tally::{tally, Results};
use crate::error::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn of_poll(poll_id: Uuid) -> Query {
    Query {
        poll_id_eq: Some(poll_id),
        ..Default::default()
    }
}

struct Recorded {
    vote: Vote,
    removed: Vec<Vote>,
    results: Results,
}

/// Records a vote. A signed-in user's earlier vote on the same poll is replaced
/// within the same transaction; anonymous votes always add a row.
pub async fn submit<T, N>(mut tx: T, notifier: &N, poll_id: Uuid, voter: Voter, submit: Submit, now: DateTime<Utc>) -> Result<Outcome, Error>
where
    T: TxStore,
    N: Notifier,
{
    let Recorded { vote, removed, results } = match record(&mut tx, poll_id, voter, submit, now).await {
        Ok(recorded) => recorded,
        Err(e) => {
            if let Err(re) = tx.rollback().await {
                log::warn!("failed to roll back vote on poll {}: {}", poll_id, re);
            }
            return Err(e);
        }
    };
    tx.commit().await?;

    let changed = !removed.is_empty();
    if changed {
        log::debug!("vote on poll {} replaced {} earlier row(s)", poll_id, removed.len());
    }
    notifier.publish_all(removed.into_iter().map(|v| Change::Delete(Row::Vote(v))));
    notifier.publish(Change::Insert(Row::Vote(vote.clone())));
    Ok(Outcome { vote, changed, results })
}

async fn record<T>(tx: &mut T, poll_id: Uuid, voter: Voter, submit: Submit, now: DateTime<Utc>) -> Result<Recorded, Error>
where
    T: TxStore,
{
    let poll = get_poll(tx, poll_id).await?;
    if poll.is_closed(now) {
        return Err(Error::Forbidden("poll is closed".into()));
    }
    if let Voter::Anonymous { already_voted: true } = voter {
        return Err(Error::Conflict("you have already voted on this poll".into()));
    }
    let option_id = submit.option_id.ok_or_else(|| Error::InvalidInput("Please select an option".into()))?;
    match OptionCommon::get(tx, option_id).await? {
        Some(option) if option.poll_id == poll_id => {}
        _ => return Err(Error::BusinessError("option does not belong to this poll".into())),
    }
    let (user_id, removed) = match voter {
        Voter::User(uid) => {
            let user_id = uid.to_string();
            let removed = VoteCommon::delete(
                tx,
                &Query {
                    poll_id_eq: Some(poll_id),
                    user_id_eq: Some(user_id.clone()),
                },
            )
            .await?;
            (user_id, removed)
        }
        Voter::Anonymous { .. } => (anonymous_identity(), vec![]),
    };
    let vote = VoteCommon::insert(tx, Insert { poll_id, option_id, user_id }).await?;
    let options = OptionCommon::query(tx, poll_id).await?;
    let votes = VoteCommon::query(tx, &of_poll(poll_id)).await?;
    Ok(Recorded {
        vote,
        removed,
        results: tally(&options, &votes),
    })
}

pub async fn list<S>(store: &mut S, poll_id: Uuid) -> Result<Vec<Vote>, Error>
where
    S: Store,
{
    get_poll(store, poll_id).await?;
    VoteCommon::query(store, &of_poll(poll_id)).await
}

pub async fn results<S>(store: &mut S, poll_id: Uuid) -> Result<Results, Error>
where
    S: Store,
{
    get_poll(store, poll_id).await?;
    let options = OptionCommon::query(store, poll_id).await?;
    let votes = VoteCommon::query(store, &of_poll(poll_id)).await?;
    Ok(tally(&options, &votes))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::poll::PollWithOptions;
    use crate::core::models::vote::ANONYMOUS_PREFIX;
    use crate::core::services::poll::test::{create_form, seed};
    use crate::database::memory::MemStore;
    use crate::impls::notifier::recorder::Recorder;
    use chrono::Duration;

    async fn setup() -> (MemStore, PollWithOptions) {
        let mut store = MemStore::new();
        let created = seed(&mut store, Uuid::new_v4(), create_form("Favourite season?", &["spring", "summer", "autumn"])).await;
        (store, created)
    }

    fn pick(option_id: Uuid) -> Submit {
        Submit { option_id: Some(option_id) }
    }

    #[tokio::test]
    async fn test_user_revote_replaces_vote() {
        let (store, created) = setup().await;
        let recorder = Recorder::default();
        let (poll_id, uid) = (created.poll.id, Uuid::new_v4());

        let first = submit(store.clone(), &recorder, poll_id, Voter::User(uid), pick(created.options[0].id), Utc::now()).await.unwrap();
        assert!(!first.changed);
        assert_eq!(first.results.total, 1);

        let second = submit(store.clone(), &recorder, poll_id, Voter::User(uid), pick(created.options[2].id), Utc::now()).await.unwrap();
        assert!(second.changed);
        assert_eq!(second.results.total, 1);
        assert_eq!(second.results.options[2].votes, 1);
        assert_eq!(second.results.options[0].votes, 0);

        let votes = store.state.borrow().votes.clone();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].option_id, created.options[2].id);
        assert_eq!(votes[0].user_id, uid.to_string());

        let changes = recorder.take();
        assert_eq!(
            changes,
            vec![
                Change::Insert(Row::Vote(first.vote.clone())),
                Change::Delete(Row::Vote(first.vote)),
                Change::Insert(Row::Vote(second.vote)),
            ]
        );
    }

    #[tokio::test]
    async fn test_anonymous_votes() {
        let (mut store, created) = setup().await;
        let recorder = Recorder::default();
        let poll_id = created.poll.id;
        let voter = Voter::Anonymous { already_voted: false };
        let a = submit(store.clone(), &recorder, poll_id, voter, pick(created.options[1].id), Utc::now()).await.unwrap();
        let b = submit(store.clone(), &recorder, poll_id, voter, pick(created.options[1].id), Utc::now()).await.unwrap();
        assert!(a.vote.user_id.starts_with(ANONYMOUS_PREFIX));
        assert_ne!(a.vote.user_id, b.vote.user_id);
        assert!(!b.changed);
        assert_eq!(b.results.total, 2);
        assert_eq!(b.results.options[1].percentage, 100);
        assert_eq!(list(&mut store, poll_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_flagged_anonymous_voter_is_rejected() {
        let (store, created) = setup().await;
        let recorder = Recorder::default();
        for option in &created.options {
            let res = submit(store.clone(), &recorder, created.poll.id, Voter::Anonymous { already_voted: true }, pick(option.id), Utc::now()).await;
            assert!(matches!(res, Err(Error::Conflict(_))));
        }
        let res = submit(store.clone(), &recorder, created.poll.id, Voter::Anonymous { already_voted: true }, Submit { option_id: None }, Utc::now()).await;
        assert!(matches!(res, Err(Error::Conflict(_))));
        assert!(store.state.borrow().votes.is_empty());
        assert!(recorder.take().is_empty());
    }

    #[tokio::test]
    async fn test_rejections() {
        let (store, created) = setup().await;
        let recorder = Recorder::default();
        let uid = Voter::User(Uuid::new_v4());
        let option = created.options[0].id;

        let res = submit(store.clone(), &recorder, Uuid::new_v4(), uid, pick(option), Utc::now()).await;
        assert!(matches!(res, Err(Error::NotFound(_))));

        let res = submit(store.clone(), &recorder, created.poll.id, uid, Submit { option_id: None }, Utc::now()).await;
        assert!(matches!(res, Err(Error::InvalidInput(_))));

        let other = seed(&mut store.clone(), Uuid::new_v4(), create_form("Other", &["x", "y"])).await;
        let res = submit(store.clone(), &recorder, created.poll.id, uid, pick(other.options[0].id), Utc::now()).await;
        assert!(matches!(res, Err(Error::BusinessError(_))));

        let res = submit(store.clone(), &recorder, created.poll.id, uid, pick(Uuid::new_v4()), Utc::now()).await;
        assert!(matches!(res, Err(Error::BusinessError(_))));
        let state = store.state.borrow();
        assert!(state.votes.is_empty());
        assert_eq!((state.commits, state.rollbacks), (0, 4));
    }

    #[tokio::test]
    async fn test_accepted_vote_commits() {
        let (store, created) = setup().await;
        let recorder = Recorder::default();
        submit(store.clone(), &recorder, created.poll.id, Voter::User(Uuid::new_v4()), pick(created.options[0].id), Utc::now()).await.unwrap();
        let state = store.state.borrow();
        assert_eq!((state.commits, state.rollbacks), (1, 0));
    }

    #[tokio::test]
    async fn test_closed_poll_rejects_votes() {
        let mut store = MemStore::new();
        let recorder = Recorder::default();
        let mut form = create_form("Closed", &["a", "b"]);
        form.closes_at = Some(Utc::now() + Duration::hours(1));
        let created = seed(&mut store, Uuid::new_v4(), form).await;
        let later = Utc::now() + Duration::hours(2);
        let res = submit(store.clone(), &recorder, created.poll.id, Voter::User(Uuid::new_v4()), pick(created.options[0].id), later).await;
        assert!(matches!(res, Err(Error::Forbidden(_))));
        // closed wins over the anonymous flag
        let res = submit(store.clone(), &recorder, created.poll.id, Voter::Anonymous { already_voted: true }, pick(created.options[0].id), later).await;
        assert!(matches!(res, Err(Error::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_results() {
        let (mut store, created) = setup().await;
        let recorder = Recorder::default();
        let poll_id = created.poll.id;
        for i in [0, 0, 1] {
            submit(store.clone(), &recorder, poll_id, Voter::User(Uuid::new_v4()), pick(created.options[i].id), Utc::now()).await.unwrap();
        }
        let results = results(&mut store, poll_id).await.unwrap();
        let pct: Vec<i64> = results.options.iter().map(|o| o.percentage).collect();
        assert_eq!(pct, vec![67, 33, 0]);
        assert!(matches!(super::results(&mut store, Uuid::new_v4()).await, Err(Error::NotFound(_))));
    }
}

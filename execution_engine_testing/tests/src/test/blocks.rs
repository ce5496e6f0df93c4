use vellum_engine_test_support::{TestChain, ACCOUNT_ALICE, DEFAULT_PUBLIC_KEY};
use vellum_execution_engine::Error;
use vellum_types::Name;

#[test]
fn should_advance_height_on_empty_blocks() {
    let mut chain = TestChain::new();
    assert_eq!(chain.height(), 0);
    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.height, 1);
    assert_eq!(summary.transactions, 0);
    let summary = chain.produce_blocks(3).expect("should produce");
    assert_eq!(summary.height, 4);
    assert_eq!(chain.height(), 4);
}

#[test]
fn should_commit_pending_state_on_block_production() {
    let mut chain = TestChain::new();
    let carol = Name::new("carol").expect("valid name");
    chain
        .create_account(ACCOUNT_ALICE.clone(), carol.clone(), *DEFAULT_PUBLIC_KEY)
        .expect("push should submit")
        .expect_success();

    // Visible speculatively, not yet committed.
    assert!(chain.state().auth().account_exists(&carol));
    assert!(!chain.committed_state().auth().account_exists(&carol));
    assert_eq!(chain.ledger().pending_transactions().len(), 1);

    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.transactions, 1);
    assert!(chain.committed_state().auth().account_exists(&carol));
    assert!(chain.ledger().pending_transactions().is_empty());
}

#[test]
fn should_count_transactions_per_block() {
    let mut chain = TestChain::new();
    for index in 0..3 {
        let account = Name::new(&format!("user{}", index + 1)).expect("valid name");
        chain
            .create_account(ACCOUNT_ALICE.clone(), account, *DEFAULT_PUBLIC_KEY)
            .expect("push should submit")
            .expect_success();
    }
    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.transactions, 3);
    // Receipts do not carry over into the next block.
    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.transactions, 0);
}

#[test]
fn should_not_retain_failed_transactions() {
    let mut chain = TestChain::new();
    let receipt = chain
        .create_account(
            ACCOUNT_ALICE.clone(),
            ACCOUNT_ALICE.clone(),
            *DEFAULT_PUBLIC_KEY,
        )
        .expect("push should submit");
    assert!(!receipt.is_success());
    // A rolled-back transaction never reaches the pending buffer.
    assert!(chain.ledger().pending_transactions().is_empty());
    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.transactions, 0);
}

#[test]
fn should_establish_identical_genesis_state_across_instances() {
    let first = TestChain::new();
    let second = TestChain::new();
    for account in ["vellum", "hello", "alice", "bob"] {
        let name = Name::new(account).expect("valid name");
        assert!(first.state().auth().account_exists(&name));
        assert!(second.state().auth().account_exists(&name));
    }
    assert_eq!(first.height(), second.height());
    assert!(first.state().tables().is_empty());
    assert!(second.state().tables().is_empty());
}

#[test]
fn should_reject_operations_after_close() {
    let mut chain = TestChain::new();
    chain.close();
    assert!(chain.is_closed());
    assert_eq!(chain.produce_block(), Err(Error::HarnessClosed));
    assert_eq!(
        chain.create_account(
            ACCOUNT_ALICE.clone(),
            Name::new("carol").expect("valid name"),
            *DEFAULT_PUBLIC_KEY,
        ),
        Err(Error::HarnessClosed)
    );
}

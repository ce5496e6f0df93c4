use vellum_engine_test_support::{
    init_logging, ActionBuilder, SandboxEngine, TestChain, TestChainBuilder, TransactionBuilder,
    ACCOUNT_ALICE, ACCOUNT_BOB, ACCOUNT_HELLO,
};
use vellum_execution_engine::{execution::EngineFault, Error, TransactionStatus};
use vellum_types::Name;

const GREETER_INTERFACE: &str = r#"{
    "version": "1",
    "actions": [
        { "name": "sayhello", "fields": [ { "name": "name", "type": "string" } ] },
        { "name": "boom" },
        { "name": "meltdown" },
        { "name": "mystery" }
    ],
    "tables": [ { "name": "greetings" } ]
}"#;

fn name(value: &str) -> Name {
    Name::new(value).expect("valid name")
}

fn register_greeter(engine: &SandboxEngine) {
    engine.register(ACCOUNT_HELLO.clone(), name("sayhello"), |context| {
        let args = context
            .args()
            .ok_or_else(|| EngineFault::revert("expected structured args"))?;
        let who = args["name"]
            .as_str()
            .ok_or_else(|| EngineFault::revert("missing name argument"))?
            .to_owned();
        context.print(&format!("hello, {}", who));
        context.set_row(
            Name::new("greetings").expect("valid name"),
            who.into_bytes(),
            b"1".to_vec(),
        );
        Ok(())
    });
    engine.register(ACCOUNT_HELLO.clone(), name("boom"), |_context| {
        Err(EngineFault::revert("boom"))
    });
    engine.register(ACCOUNT_HELLO.clone(), name("meltdown"), |_context| {
        Err(EngineFault::fatal("engine memory corrupted"))
    });
}

fn deployed_chain(contracts_console: bool) -> TestChain {
    init_logging();
    let engine = SandboxEngine::new();
    register_greeter(&engine);
    let mut chain = TestChainBuilder::with_engine(engine)
        .with_contracts_console(contracts_console)
        .build();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            GREETER_INTERFACE.as_bytes(),
        )
        .expect("deploy should submit")
        .expect_success();
    chain
}

#[test]
fn should_execute_structured_action_and_store_row() {
    let mut chain = deployed_chain(true);
    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "world" }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    receipt.expect_success();
    assert_eq!(receipt.console(), "hello, world");
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("greetings"), b"world"),
        Some(b"1".to_vec())
    );
}

#[test]
fn should_pass_raw_payload_through_untouched() {
    let engine = SandboxEngine::new();
    engine.register(ACCOUNT_HELLO.clone(), name("rawstore"), |context| {
        let data = context.data().to_vec();
        context.set_row(Name::new("blobs").expect("valid name"), b"last".to_vec(), data);
        Ok(())
    });
    let mut chain = TestChainBuilder::with_engine(engine).build();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            GREETER_INTERFACE.as_bytes(),
        )
        .expect("deploy should submit")
        .expect_success();

    // Raw payloads bypass the interface description entirely; the
    // action does not even have to be declared there.
    let action = ActionBuilder::new(ACCOUNT_HELLO.clone(), name("rawstore"))
        .with_raw_payload(vec![0xde, 0xad, 0xbe, 0xef])
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();
    chain
        .push_actions(vec![action])
        .expect("push should submit")
        .expect_success();
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("blobs"), b"last"),
        Some(vec![0xde, 0xad, 0xbe, 0xef])
    );
}

#[test]
fn should_check_authorization_before_contract_lookup() {
    let mut chain = deployed_chain(false);
    // No contract on `bob`, and no signing keys either: the failure
    // must be the authorization one.
    let transaction = TransactionBuilder::new()
        .with_action(
            ActionBuilder::new(ACCOUNT_BOB.clone(), name("anything"))
                .with_active_authorization(ACCOUNT_ALICE.clone())
                .build(),
        )
        .build();
    let receipt = chain
        .push_transaction(transaction)
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::Authorization(_)));
}

#[test]
fn should_report_no_such_contract() {
    let mut chain = deployed_chain(false);
    let receipt = chain
        .push_action(
            ACCOUNT_BOB.clone(),
            name("anything"),
            serde_json::json!({}),
            ACCOUNT_BOB.clone(),
        )
        .expect("push should submit");
    match receipt.expect_failure() {
        Error::NoSuchContract(account) => assert_eq!(account, &*ACCOUNT_BOB),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn should_reject_undecodable_payload() {
    let mut chain = deployed_chain(false);
    // Missing the declared `name` field.
    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "greeting": "hi" }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::PayloadDecode(_)));
    assert!(chain
        .query_table(&ACCOUNT_HELLO, &name("greetings"))
        .is_empty());
}

#[test]
fn should_roll_back_whole_transaction_on_action_failure() {
    let mut chain = deployed_chain(false);
    let sayhello = ActionBuilder::new(ACCOUNT_HELLO.clone(), name("sayhello"))
        .with_structured_payload(serde_json::json!({ "name": "world" }))
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();
    let boom = ActionBuilder::new(ACCOUNT_HELLO.clone(), name("boom"))
        .with_structured_payload(serde_json::json!({}))
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();

    let receipt = chain
        .push_actions(vec![sayhello, boom])
        .expect("push should submit");
    assert_eq!(receipt.status, TransactionStatus::Failed);
    assert_eq!(
        receipt.expect_failure(),
        &Error::Execution("boom".to_string())
    );
    // The first action's write must be rolled back with the rest.
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("greetings"), b"world"),
        None
    );
}

#[test]
fn should_capture_console_only_when_enabled() {
    let mut chain = deployed_chain(false);
    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "world" }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    receipt.expect_success();
    assert_eq!(receipt.console(), "");
}

#[test]
fn should_truncate_console_at_configured_limit() {
    let engine = SandboxEngine::new();
    register_greeter(&engine);
    let mut chain = TestChainBuilder::with_engine(engine)
        .with_contracts_console(true)
        .with_max_console_bytes(8)
        .build();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            GREETER_INTERFACE.as_bytes(),
        )
        .expect("deploy should submit")
        .expect_success();

    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "rumpelstiltskin" }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    receipt.expect_success();
    assert_eq!(receipt.console(), "hello, r");
}

#[test]
fn should_revert_actions_without_a_handler() {
    let mut chain = deployed_chain(false);
    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("mystery"),
            serde_json::json!({}),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::Execution(_)));
}

#[test]
fn should_surface_failures_as_errors_when_receipts_disabled() {
    let engine = SandboxEngine::new();
    register_greeter(&engine);
    let mut chain = TestChainBuilder::with_engine(engine)
        .with_error_receipts(false)
        .build();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            GREETER_INTERFACE.as_bytes(),
        )
        .expect("deploy should submit")
        .expect_success();

    let result = chain.push_action(
        ACCOUNT_HELLO.clone(),
        name("boom"),
        serde_json::json!({}),
        ACCOUNT_ALICE.clone(),
    );
    assert_eq!(result, Err(Error::Execution("boom".to_string())));
    // The chain stays usable; only the transaction was rolled back.
    assert!(!chain.is_closed());
}

#[test]
fn should_tear_down_on_fatal_engine_fault() {
    let mut chain = deployed_chain(false);
    let result = chain.push_action(
        ACCOUNT_HELLO.clone(),
        name("meltdown"),
        serde_json::json!({}),
        ACCOUNT_ALICE.clone(),
    );
    assert_eq!(
        result,
        Err(Error::FatalEngineFault("engine memory corrupted".to_string()))
    );
    assert!(chain.is_closed());
    assert_eq!(
        chain.push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "world" }),
            ACCOUNT_ALICE.clone(),
        ),
        Err(Error::HarnessClosed)
    );
}

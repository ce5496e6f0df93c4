use vellum_engine_test_support::{
    ActionBuilder, SandboxEngine, TestChain, TestChainBuilder, ACCOUNT_ALICE, ACCOUNT_HELLO,
};
use vellum_execution_engine::{
    execution::EngineFault,
    system::{SETCODE_ACTION, SYSTEM_ACCOUNT},
    Error,
};
use vellum_types::{interface::InterfaceError, Name};

const FIRST_INTERFACE: &str = r#"{
    "version": "1",
    "actions": [ { "name": "first" } ]
}"#;

const SECOND_INTERFACE: &str = r#"{
    "version": "2",
    "actions": [ { "name": "second" } ]
}"#;

fn name(value: &str) -> Name {
    Name::new(value).expect("valid name")
}

fn chain_with_handlers() -> TestChain {
    let engine = SandboxEngine::new();
    engine.register(ACCOUNT_HELLO.clone(), name("first"), |_| Ok(()));
    engine.register(ACCOUNT_HELLO.clone(), name("second"), |_| Ok(()));
    TestChainBuilder::with_engine(engine).build()
}

#[test]
fn should_deploy_and_mark_account() {
    let mut chain = chain_with_handlers();
    assert!(!chain.state().contracts().is_deployed(&ACCOUNT_HELLO));
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            FIRST_INTERFACE.as_bytes(),
        )
        .expect("push should submit")
        .expect_success();
    assert!(chain.state().contracts().is_deployed(&ACCOUNT_HELLO));
}

#[test]
fn should_replace_contract_wholesale_on_redeploy() {
    let mut chain = chain_with_handlers();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            FIRST_INTERFACE.as_bytes(),
        )
        .expect("push should submit")
        .expect_success();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            SECOND_INTERFACE.as_bytes(),
        )
        .expect("push should submit")
        .expect_success();

    // The first interface is gone with the first deployment.
    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("first"),
            serde_json::json!({}),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    assert_eq!(
        receipt.expect_failure(),
        &Error::PayloadDecode(InterfaceError::UnknownAction(name("first")))
    );
    chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("second"),
            serde_json::json!({}),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit")
        .expect_success();
}

#[test]
fn should_reject_code_the_engine_cannot_load() {
    let mut chain = chain_with_handlers();
    let receipt = chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            b"not a sandbox blob".to_vec(),
            FIRST_INTERFACE.as_bytes(),
        )
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::InvalidCode(_)));
    assert!(!chain.state().contracts().is_deployed(&ACCOUNT_HELLO));
}

#[test]
fn should_reject_malformed_interface_description() {
    let mut chain = chain_with_handlers();
    let receipt = chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            b"] not json [",
        )
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::InvalidCode(_)));
    assert!(!chain.state().contracts().is_deployed(&ACCOUNT_HELLO));
}

#[test]
fn should_reject_fatal_validation_fault_and_close() {
    struct PoisonedEngine;

    impl vellum_execution_engine::execution::ExecutionEngine for PoisonedEngine {
        fn validate_code(&self, _code: &[u8]) -> Result<(), EngineFault> {
            Err(EngineFault::fatal("validator crashed"))
        }

        fn execute(
            &mut self,
            _context: &mut vellum_execution_engine::execution::ExecutionContext<'_>,
        ) -> Result<vellum_execution_engine::execution::ExecutionOutcome, EngineFault> {
            Ok(Default::default())
        }
    }

    let mut chain = TestChainBuilder::with_engine(PoisonedEngine).build();
    let result = chain.deploy_contract(
        ACCOUNT_HELLO.clone(),
        b"anything".to_vec(),
        FIRST_INTERFACE.as_bytes(),
    );
    assert_eq!(
        result,
        Err(Error::FatalEngineFault("validator crashed".to_string()))
    );
    assert!(chain.is_closed());
}

#[test]
fn should_undeploy_and_stop_dispatching() {
    let mut chain = chain_with_handlers();
    chain
        .deploy_contract(
            ACCOUNT_HELLO.clone(),
            SandboxEngine::valid_code(),
            FIRST_INTERFACE.as_bytes(),
        )
        .expect("push should submit")
        .expect_success();
    chain
        .undeploy_contract(ACCOUNT_HELLO.clone())
        .expect("push should submit")
        .expect_success();
    assert!(!chain.state().contracts().is_deployed(&ACCOUNT_HELLO));

    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("first"),
            serde_json::json!({}),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::NoSuchContract(_)));

    // Undeploying twice reports the absence as well.
    let receipt = chain
        .undeploy_contract(ACCOUNT_HELLO.clone())
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::NoSuchContract(_)));
}

#[test]
fn should_require_the_account_authority_for_deploy() {
    let mut chain = chain_with_handlers();
    // alice tries to deploy onto hello without hello's authority.
    let payload = serde_json::json!({
        "account": "hello",
        "code": hex::encode(SandboxEngine::valid_code()),
        "interface": hex::encode(FIRST_INTERFACE.as_bytes()),
    });
    let action = ActionBuilder::new(SYSTEM_ACCOUNT.clone(), SETCODE_ACTION.clone())
        .with_structured_payload(payload)
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();
    let receipt = chain
        .push_actions(vec![action])
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::Authorization(_)));
    assert!(!chain.state().contracts().is_deployed(&ACCOUNT_HELLO));
}

use rand::{rngs::StdRng, SeedableRng};

use vellum_engine_test_support::{
    init_logging, ActionBuilder, SandboxEngine, TestChain, TestChainBuilder, ACCOUNT_ALICE,
    ACCOUNT_HELLO, DEFAULT_PUBLIC_KEY,
};
use vellum_execution_engine::{
    authority::{ACTIVE_PERMISSION, OWNER_PERMISSION},
    execution::EngineFault,
    Error,
};
use vellum_types::{
    crypto::{recover_secp256k1, sha256},
    Authority, KeyWeight, Name, PermissionLevel, PermissionLevelWeight, PublicKey, SecretKey,
    Signature, Weight,
};

const GREETER_INTERFACE: &str = r#"{
    "version": "1",
    "actions": [
        { "name": "sayhello", "fields": [ { "name": "name", "type": "string" } ] },
        {
            "name": "testrecover",
            "fields": [
                { "name": "msg", "type": "string" },
                { "name": "sig", "type": "signature" },
                { "name": "expected", "type": "public_key" }
            ]
        }
    ],
    "tables": [ { "name": "greetings" } ]
}"#;

fn name(value: &str) -> Name {
    Name::new(value).expect("valid name")
}

fn register_contract(engine: &SandboxEngine) {
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
    engine.register(ACCOUNT_HELLO.clone(), name("testrecover"), |context| {
        let args = context
            .args()
            .ok_or_else(|| EngineFault::revert("expected structured args"))?;
        let message = args["msg"]
            .as_str()
            .ok_or_else(|| EngineFault::revert("missing msg argument"))?;
        let signature: Signature = args["sig"]
            .as_str()
            .ok_or_else(|| EngineFault::revert("missing sig argument"))?
            .parse()
            .map_err(|error| EngineFault::revert(format!("bad signature: {}", error)))?;
        let expected: PublicKey = args["expected"]
            .as_str()
            .ok_or_else(|| EngineFault::revert("missing expected argument"))?
            .parse()
            .map_err(|error| EngineFault::revert(format!("bad public key: {}", error)))?;

        let digest = sha256(message.as_bytes());
        let recovered = recover_secp256k1(&digest, &signature)
            .map_err(|error| EngineFault::revert(error.to_string()))?;
        if recovered != expected {
            return Err(EngineFault::revert("recovered key does not match"));
        }
        context.print("recovered");
        Ok(())
    });
}

fn deployed_chain() -> TestChain {
    init_logging();
    let engine = SandboxEngine::new();
    register_contract(&engine);
    let mut chain = TestChainBuilder::with_engine(engine)
        .with_contracts_console(true)
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

// The classic deployment flow: rewrite the contract account's `active`
// authority to a key plus a delegation to its own code permission, then
// greet. The code permission does not exist, so it contributes no
// weight; the key alone satisfies the threshold.
#[test]
fn should_update_authority_then_greet() {
    let mut chain = deployed_chain();

    let auth = Authority::new(
        1,
        vec![KeyWeight {
            key: *DEFAULT_PUBLIC_KEY,
            weight: Weight::new(1),
        }],
        vec![PermissionLevelWeight {
            permission: PermissionLevel::new(ACCOUNT_HELLO.clone(), name("vellum.code")),
            weight: Weight::new(1),
        }],
    );
    chain
        .update_authority(
            ACCOUNT_HELLO.clone(),
            ACTIVE_PERMISSION.clone(),
            Some(OWNER_PERMISSION.clone()),
            auth,
        )
        .expect("push should submit")
        .expect_success();

    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "alice" }),
            ACCOUNT_HELLO.clone(),
        )
        .expect("push should submit");
    receipt.expect_success();
    assert_eq!(receipt.console(), "hello, alice");
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("greetings"), b"alice"),
        Some(b"1".to_vec())
    );

    // Deploy, authority update and greeting are all still pending.
    let summary = chain.produce_block().expect("should produce");
    assert_eq!(summary.transactions, 3);
}

#[test]
fn should_recover_secp256k1_signer_inside_contract() {
    let mut chain = deployed_chain();
    let mut rng = StdRng::seed_from_u64(71);
    let secret = SecretKey::random_secp256k1(&mut rng);
    let message = "hello,world";
    let signature = secret.sign(message.as_bytes()).expect("signing should work");

    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("testrecover"),
            serde_json::json!({
                "msg": message,
                "sig": signature.to_string(),
                "expected": secret.public_key().to_string(),
            }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    receipt.expect_success();
    assert_eq!(receipt.console(), "recovered");
}

#[test]
fn should_reject_recovery_against_the_wrong_key() {
    let mut chain = deployed_chain();
    let mut rng = StdRng::seed_from_u64(72);
    let signer = SecretKey::random_secp256k1(&mut rng);
    let other = SecretKey::random_secp256k1(&mut rng);
    let message = "hello,world";
    let signature = signer.sign(message.as_bytes()).expect("signing should work");

    let receipt = chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("testrecover"),
            serde_json::json!({
                "msg": message,
                "sig": signature.to_string(),
                "expected": other.public_key().to_string(),
            }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit");
    assert_eq!(
        receipt.expect_failure(),
        &Error::Execution("recovered key does not match".to_string())
    );
}

#[test]
fn should_leave_state_untouched_by_missing_contract_failures() {
    let mut chain = deployed_chain();
    chain
        .push_action(
            ACCOUNT_HELLO.clone(),
            name("sayhello"),
            serde_json::json!({ "name": "world" }),
            ACCOUNT_ALICE.clone(),
        )
        .expect("push should submit")
        .expect_success();
    chain.produce_block().expect("should produce");

    let greet_moon = ActionBuilder::new(ACCOUNT_HELLO.clone(), name("sayhello"))
        .with_structured_payload(serde_json::json!({ "name": "moon" }))
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();
    let missing = ActionBuilder::new(ACCOUNT_ALICE.clone(), name("sayhello"))
        .with_structured_payload(serde_json::json!({ "name": "moon" }))
        .with_active_authorization(ACCOUNT_ALICE.clone())
        .build();
    let height_before = chain.height();
    let receipt = chain
        .push_actions(vec![greet_moon, missing])
        .expect("push should submit");
    assert!(matches!(receipt.expect_failure(), Error::NoSuchContract(_)));

    // Height and the pending buffer are untouched by the failure.
    assert_eq!(chain.height(), height_before);
    assert!(chain.ledger().pending_transactions().is_empty());

    // The committed greeting survives; the rolled-back one does not.
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("greetings"), b"world"),
        Some(b"1".to_vec())
    );
    assert_eq!(
        chain.query_row(&ACCOUNT_HELLO, &name("greetings"), b"moon"),
        None
    );
}

use eduportal_api::auth::{issue_token, verify_token, Role};
use uuid::Uuid;

// Single test function: the config singleton latches environment on first
// access, so the secret must stay scoped around every token call.
#[test]
fn issued_tokens_verify_to_the_same_principal() {
    temp_env::with_vars(
        [
            ("JWT_SECRET", Some("integration-test-secret")),
            ("JWT_EXPIRES_DAYS", Some("7")),
        ],
        || {
            let student_id = Uuid::new_v4();
            let token = issue_token(student_id, Role::Student).expect("issue student token");
            let claims = verify_token(&token).expect("verify student token");
            assert_eq!(claims.id, student_id);
            assert_eq!(claims.role, Role::Student);

            let admin_id = Uuid::new_v4();
            let token = issue_token(admin_id, Role::Admin).expect("issue admin token");
            let claims = verify_token(&token).expect("verify admin token");
            assert_eq!(claims.id, admin_id);
            assert_eq!(claims.role, Role::Admin);

            // A mangled token is rejected outright
            assert!(verify_token("not.a.token").is_err());
        },
    );
}

mod support;

use calometer_core::api::paths;
use calometer_core::screens::{BodyDetailsScreen, DashboardScreen, LoginField, LoginScreen};
use calometer_core::{
    GateDecision, GateState, NavigationIntent, Reason, Route, SessionGate, SessionRule,
    SubmitOutcome, GENERIC_FAILURE_MESSAGE,
};
use serde_json::json;
use support::{context, context_with_rule, dead_addr, exists, Backend, Reply};

fn fill_login(screen: &mut LoginScreen) {
    screen.set_field(LoginField::Username, "ada");
    screen.set_field(LoginField::Password, "secret1");
}

#[tokio::test]
async fn login_probes_body_details_exactly_once() {
    let backend = Backend::new();
    backend
        .reply(paths::LOGIN, Reply::ok(json!(null)))
        .reply(paths::BODY_DETAILS_EXISTS, exists(true));
    let (addr, handle) = backend.spawn().await;
    let (ctx, notifier) = context(addr);

    let mut screen = LoginScreen::new(&ctx);
    fill_login(&mut screen);
    let outcome = screen.submit(&ctx).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Navigate(NavigationIntent::new(Route::Dashboard, Reason::Login))
    );
    assert_eq!(backend.hits(paths::BODY_DETAILS_EXISTS), 1);
    assert_eq!(backend.hits(paths::LOGIN), 1);
    assert_eq!(notifier.successes(), vec!["Login successful"]);
    assert!(notifier.errors().is_empty());
    assert!(!screen.is_loading());

    handle.abort();
}

#[tokio::test]
async fn login_without_body_details_goes_to_onboarding() {
    let backend = Backend::new();
    backend
        .reply(paths::LOGIN, Reply::ok(json!(null)))
        .reply(paths::BODY_DETAILS_EXISTS, exists(false));
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = LoginScreen::new(&ctx);
    fill_login(&mut screen);

    assert_eq!(
        screen.submit(&ctx).await,
        SubmitOutcome::Navigate(NavigationIntent::new(Route::AddBodyDetails, Reason::Login))
    );
    assert_eq!(screen.gate().state(), GateState::RedirectOnboarding);

    handle.abort();
}

#[tokio::test]
async fn login_mount_with_live_session_moves_on() {
    let backend = Backend::new();
    backend
        .reply(paths::LOGIN, Reply::ok(json!(null)))
        .reply(paths::BODY_DETAILS_EXISTS, exists(true));
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = LoginScreen::new(&ctx);
    let decision = screen.mount(&ctx, None).await;

    assert_eq!(
        decision,
        GateDecision::Redirect(NavigationIntent::new(Route::Dashboard, Reason::Login))
    );
    assert_eq!(backend.last_body(paths::LOGIN), Some(json!({})));

    handle.abort();
}

#[tokio::test]
async fn login_mount_without_session_renders_form() {
    let backend = Backend::new();
    backend.reply(
        paths::LOGIN,
        Reply::envelope(401, "Unauthorized", json!(null)),
    );
    let (addr, handle) = backend.spawn().await;
    let (ctx, notifier) = context(addr);

    let mut screen = LoginScreen::new(&ctx);

    assert_eq!(screen.mount(&ctx, None).await, GateDecision::Render);
    assert_eq!(backend.hits(paths::BODY_DETAILS_EXISTS), 0);
    assert!(notifier.errors().is_empty());

    handle.abort();
}

#[tokio::test]
async fn dashboard_trusts_reason_from_login() {
    let backend = Backend::new();
    backend
        .reply(
            paths::NET_CALORIC_BALANCE,
            Reply::ok(json!({ "net_caloric_balance": 0 })),
        )
        .reply(paths::LOG_GET, Reply::ok(json!({ "monthly_logs": {} })));
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = DashboardScreen::new(&ctx);
    let decision = screen.mount(&ctx, Some(Reason::Login)).await;

    assert_eq!(decision, GateDecision::Render);
    assert_eq!(backend.hits(paths::BODY_DETAILS_EXISTS), 0);
    assert_eq!(screen.gate().probes_issued(), 0);

    handle.abort();
}

#[tokio::test]
async fn dashboard_probes_when_arriving_from_onboarding() {
    let backend = Backend::new();
    backend
        .reply(paths::BODY_DETAILS_EXISTS, exists(false))
        .reply(
            paths::NET_CALORIC_BALANCE,
            Reply::ok(json!({ "net_caloric_balance": 0 })),
        )
        .reply(paths::LOG_GET, Reply::ok(json!({ "monthly_logs": {} })));
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = DashboardScreen::new(&ctx);
    let decision = screen.mount(&ctx, Some(Reason::AddBodyDetails)).await;

    assert_eq!(
        decision,
        GateDecision::Redirect(NavigationIntent::new(
            Route::AddBodyDetails,
            Reason::Dashboard
        ))
    );
    assert_eq!(backend.hits(paths::BODY_DETAILS_EXISTS), 1);
    assert_eq!(screen.gate().probes_issued(), 1);

    handle.abort();
}

#[tokio::test]
async fn onboarding_probes_when_arriving_from_dashboard() {
    let backend = Backend::new();
    backend.reply(paths::BODY_DETAILS_EXISTS, exists(true));
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = BodyDetailsScreen::new(&ctx);
    let decision = screen.mount(&ctx, Some(Reason::Dashboard)).await;

    assert_eq!(
        decision,
        GateDecision::Redirect(NavigationIntent::new(
            Route::Dashboard,
            Reason::AddBodyDetails
        ))
    );
    assert_eq!(backend.hits(paths::BODY_DETAILS_EXISTS), 1);

    handle.abort();
}

#[tokio::test]
async fn expired_session_on_dashboard_returns_to_login() {
    let backend = Backend::new();
    backend.reply(
        paths::BODY_DETAILS_EXISTS,
        Reply::envelope(401, "Unauthorized", json!(null)),
    );
    let (addr, handle) = backend.spawn().await;
    let (ctx, _notifier) = context(addr);

    let mut screen = DashboardScreen::new(&ctx);
    let decision = screen.mount(&ctx, None).await;

    assert_eq!(
        decision,
        GateDecision::Redirect(NavigationIntent::new(Route::Login, Reason::Dashboard))
    );
    assert_eq!(screen.gate().state(), GateState::RedirectLogin);

    handle.abort();
}

#[tokio::test]
async fn onboarded_user_is_sent_from_onboarding_to_dashboard() {
    let backend = Backend::new();
    backend.reply(paths::BODY_DETAILS_EXISTS, exists(true));
    let (addr, handle) = backend.spawn().await;
    let (ctx, notifier) = context(addr);

    let mut gate = SessionGate::new(Route::AddBodyDetails, SessionRule::default());
    let decision = gate.mount(&ctx.api, &notifier, Some(Reason::Nav)).await;

    assert_eq!(
        decision,
        GateDecision::Redirect(NavigationIntent::new(
            Route::Dashboard,
            Reason::AddBodyDetails
        ))
    );

    handle.abort();
}

#[tokio::test]
async fn transport_failure_settles_neutral_with_one_error() {
    let (ctx, notifier) = context(dead_addr().await);

    let mut gate = SessionGate::new(Route::AddBodyDetails, SessionRule::default());
    let decision = gate.mount(&ctx.api, &notifier, None).await;

    assert_eq!(decision, GateDecision::Hold);
    assert_eq!(gate.state(), GateState::Neutral);
    assert_eq!(notifier.errors(), vec![GENERIC_FAILURE_MESSAGE]);
}

#[tokio::test]
async fn session_rule_decides_what_a_server_error_means() {
    let backend = Backend::new();
    backend.reply(
        paths::BODY_DETAILS_EXISTS,
        Reply::envelope(500, "Database unavailable", json!(null)),
    );
    let (addr, handle) = backend.spawn().await;

    let (strict_ctx, strict_notifier) = context_with_rule(addr, SessionRule::Unauthorized);
    let mut strict = SessionGate::new(Route::Dashboard, SessionRule::Unauthorized);
    assert_eq!(
        strict.mount(&strict_ctx.api, &strict_notifier, None).await,
        GateDecision::Hold
    );
    assert_eq!(strict.state(), GateState::Neutral);
    assert_eq!(strict_notifier.errors(), vec!["Database unavailable"]);

    let (loose_ctx, loose_notifier) = context_with_rule(addr, SessionRule::NotOk);
    let mut loose = SessionGate::new(Route::Dashboard, SessionRule::NotOk);
    assert_eq!(
        loose.mount(&loose_ctx.api, &loose_notifier, None).await,
        GateDecision::Redirect(NavigationIntent::new(Route::Login, Reason::Dashboard))
    );
    assert!(loose_notifier.errors().is_empty());

    handle.abort();
}

#[tokio::test]
async fn unreadable_probe_body_is_not_a_redirect() {
    let backend = Backend::new();
    backend.reply(paths::BODY_DETAILS_EXISTS, Reply::raw(502, "<html>bad gateway</html>"));
    let (addr, handle) = backend.spawn().await;
    let (ctx, notifier) = context(addr);

    let mut gate = SessionGate::new(Route::Dashboard, SessionRule::NotOk);

    assert_eq!(gate.mount(&ctx.api, &notifier, None).await, GateDecision::Hold);
    assert_eq!(gate.state(), GateState::Neutral);
    assert_eq!(notifier.errors(), vec![GENERIC_FAILURE_MESSAGE]);

    handle.abort();
}

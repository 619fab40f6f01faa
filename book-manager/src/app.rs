use crate::environment::ENVIRONMENT;
use crate::pages::{Dashboard, SignInPage};
use leptos::prelude::*;
use leptos_asgardeo_auth::components::{FaultBoundary, ShowWhenAuthenticated};
use leptos_asgardeo_auth::{
    init_asgardeo_auth, SessionStrategy, StorageType, UseAsgardeoAuthOptions,
};
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use url::Url;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <FaultBoundary>
            <Router>
                <main>
                    <Routes fallback=|| view! { "Page not found." }>
                        <Route path=path!("/") view=Home/>
                    </Routes>
                </main>
            </Router>
        </FaultBoundary>
    }
}

#[component]
fn Home() -> impl IntoView {
    // Must run inside the `Router`: callback parameters are read through it.
    let _auth = init_asgardeo_auth(UseAsgardeoAuthOptions {
        strategy: SessionStrategy::CookieSession,
        api_base_url: Url::parse(ENVIRONMENT.api_base_url).expect("valid api base url"),
        auth_gateway_url: Url::parse(ENVIRONMENT.auth_gateway_url).expect("valid auth gateway url"),
        idp: None,
        post_login_redirect_url: Url::parse(ENVIRONMENT.app_url).expect("valid app url"),
        post_logout_redirect_url: Url::parse(ENVIRONMENT.app_url).expect("valid app url"),
        scope: vec![],
        token_storage: StorageType::Local,
        advanced: Default::default(),
    });

    view! {
        <ShowWhenAuthenticated
            fallback=|| view! { <SignInPage/> }
            children=move |auth| view! { <Dashboard auth/> }
        />
    }
}

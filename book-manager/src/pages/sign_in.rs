use leptos::prelude::*;
use leptos_asgardeo_auth::{use_asgardeo_auth, SessionState};

#[component]
pub fn SignInPage() -> impl IntoView {
    let auth = use_asgardeo_auth();

    let login_url = Signal::derive(move || {
        auth.login_url
            .get()
            .map(|url| url.to_string())
            .unwrap_or_default()
    });
    let last_error = Signal::derive(move || match auth.state.get() {
        SessionState::NotAuthenticated(it) => it.last_error.get(),
        _ => None,
    });

    view! {
        <div class="sign-in">
            <h1>"Book Manager"</h1>
            <p>"Manage your personal library."</p>

            { move || last_error.get().map(|msg| view! {
                <div class="banner banner-error">{ msg }</div>
            }) }

            <a class="button" id="sign-in" href=move || login_url.get()>
                "Sign in"
            </a>
        </div>
    }
}

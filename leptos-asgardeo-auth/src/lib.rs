//! Session management and authenticated API access for Leptos apps deployed behind an
//! auth-aware gateway (Choreo managed authentication) or talking to Asgardeo directly.
//!
//! ```no_run
//! use leptos::prelude::*;
//! use leptos_router::{path, components::{Route, Router, Routes}};
//! use leptos_asgardeo_auth::{
//!     components::ShowWhenAuthenticated, init_asgardeo_auth, url::Url, SessionStrategy,
//!     StorageType, UseAsgardeoAuthOptions,
//! };
//!
//! #[component]
//! pub fn App() -> impl IntoView {
//!     view! {
//!         <main>
//!             <Router>
//!                 <Routes fallback=|| view! { "Page not found." }>
//!                     <Route path=path!("/") view=Home/>
//!                 </Routes>
//!             </Router>
//!         </main>
//!     }
//! }
//!
//! #[component]
//! pub fn Home() -> impl IntoView {
//!     // Note: These values should come from environment variables in production.
//!     // Note: Must be called inside the `Router`, as callback parameters are read through it.
//!     let auth = init_asgardeo_auth(UseAsgardeoAuthOptions {
//!         strategy: SessionStrategy::CookieSession,
//!         api_base_url: Url::parse("http://localhost:8080/").unwrap(),
//!         auth_gateway_url: Url::parse("http://localhost:8080/").unwrap(),
//!         idp: None,
//!         post_login_redirect_url: Url::parse("http://localhost:3000/").unwrap(),
//!         post_logout_redirect_url: Url::parse("http://localhost:3000/").unwrap(),
//!         scope: vec![],
//!         token_storage: StorageType::Local,
//!         advanced: Default::default(),
//!     });
//!
//!     view! {
//!         <ShowWhenAuthenticated
//!             fallback=move || view! {
//!                 <a href={ auth.login_url.get().map(|it| it.to_string()).unwrap_or_default() }>"Sign in"</a>
//!             }
//!             children=move |auth| view! {
//!                 <p>"Welcome, " { move || auth.profile.read().display_name().to_owned() }</p>
//!             }
//!         />
//!     }
//! }
//! ```

mod books;
pub mod components;
mod config;
mod csrf;
mod error;
mod gateway;
mod hooks;
mod login;
mod logout;
mod one_shot;
mod pkce;
mod profile;
mod request;
mod response;
mod retry;
mod session;
mod storage;
mod strategy;
mod token;

// Library exports (additional to pub modules).
pub use books::*;
pub use config::*;
pub use error::AsgardeoAuthError;
pub use gateway::*;
pub use hooks::*;
pub use leptos_use::storage::StorageType;
pub use profile::UserProfile;
pub use request::RequestError;
pub use retry::RetryPolicy;
pub use session::*;
pub use strategy::SessionStrategy;
pub use token::TokenData;
pub mod url {
    pub use url::Url;
}
pub mod reqwest {
    pub use reqwest::*;
}

type AccessToken = String;

use crate::session::SessionState;
use crate::use_asgardeo_auth;
use leptos::either::EitherOf3;
use leptos::prelude::*;

/// Show `children` only when the user is authenticated, providing direct access to the
/// [`Authenticated`](crate::Authenticated) state (also provided as context, so deeper
/// components can use [`use_authenticated`](crate::use_authenticated)).
///
/// While the startup session check is still pending, NOTHING is rendered. Protected content
/// must not flash up for a user who turns out to be signed out, and a sign-in page must not
/// flash up for a user who turns out to be signed in.
///
/// # Example
/// ```no_run
/// use leptos::prelude::*;
/// use leptos_asgardeo_auth::components::ShowWhenAuthenticated;
///
/// # #[component]
/// # fn Component() -> impl IntoView {
/// view! {
///     <ShowWhenAuthenticated fallback=|| view! { <p>"Please sign in."</p> } children=move |auth| view! {
///         <p>"Welcome, " { move || auth.profile.read().display_name().to_owned() }</p>
///     }/>
/// }
/// # }
/// ```
#[component(transparent)]
#[allow(clippy::must_use_candidate)]
pub fn ShowWhenAuthenticated<C, V>(
    /// Rendered when the user is NOT authenticated, e.g. a sign-in prompt.
    #[prop(into, optional)]
    fallback: Option<ViewFn>,

    children: C,
) -> impl IntoView
where
    C: Fn(crate::Authenticated) -> V + 'static + Send,
    V: IntoView + 'static,
{
    let auth = use_asgardeo_auth();
    let state = auth.state();

    move || match state.get() {
        SessionState::Authenticated(authenticated_ctx) => {
            let _ = take_context::<crate::NotAuthenticated>();
            provide_context(authenticated_ctx);
            EitherOf3::<AnyView, AnyView, AnyView>::A(children(authenticated_ctx).into_any())
        }
        SessionState::NotAuthenticated(not_authenticated_ctx) => {
            let _ = take_context::<crate::Authenticated>();
            provide_context(not_authenticated_ctx);
            EitherOf3::<AnyView, AnyView, AnyView>::B(match &fallback {
                Some(f) => f.run(),
                None => ().into_any(),
            })
        }
        SessionState::Loading => {
            let _ = take_context::<crate::Authenticated>();
            EitherOf3::<AnyView, AnyView, AnyView>::C(().into_any())
        }
    }
}

/// Top-level rendering fault isolation.
///
/// Wraps `children` in an `ErrorBoundary` that swaps any rendering error for a generic
/// recovery screen with a reload action. Session state and the API layer are untouched by a
/// rendering fault; reloading re-runs the startup session check against whatever session
/// still exists.
///
/// Place this ABOVE the router and the auth init call, so a fault in either still hits the
/// boundary.
#[component]
#[allow(clippy::must_use_candidate)]
pub fn FaultBoundary(children: ChildrenFn) -> impl IntoView {
    view! {
        <ErrorBoundary fallback=|errors| {
            tracing::error!(errors = ?errors.get(), "Rendering failed. Showing the recovery screen.");
            view! {
                <div class="fault-boundary">
                    <h2>"Something went wrong"</h2>
                    <p>"An unexpected error occurred. Reloading usually fixes this."</p>
                    <button on:click=|_| {
                        if let Err(err) = window().location().reload() {
                            tracing::error!(?err, "Could not reload the page");
                        }
                    }>
                        "Reload page"
                    </button>
                </div>
            }
        }>
            { children() }
        </ErrorBoundary>
    }
}

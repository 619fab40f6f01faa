use crate::request::RequestError;
use snafu::Snafu;

/// Errors of the session manager itself. These never reach the UI directly; they are logged
/// and condensed into the `last_error` message of the `NotAuthenticated` state.
#[derive(Debug, Snafu)]
pub enum AsgardeoAuthError {
    #[snafu(display("AsgardeoAuthError: Request error"))]
    Request { source: RequestError },

    #[snafu(display(
        "AsgardeoAuthError: The 'state' returned by the authorization callback did not match the one sent. Rejecting the callback."
    ))]
    CallbackStateMismatch,

    #[snafu(display("AsgardeoAuthError: Could not handle parameters: {err}"))]
    Params {
        err: leptos_router::params::ParamsError,
    },
}

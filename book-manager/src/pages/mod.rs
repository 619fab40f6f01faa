mod dashboard;
mod sign_in;

pub use dashboard::Dashboard;
pub use sign_in::SignInPage;

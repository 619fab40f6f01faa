use leptos::prelude::*;
use leptos_asgardeo_auth::{
    use_asgardeo_auth, Authenticated, Book, BookApi, BookDraft, BookStore,
};

/// Owns the book cache for the lifetime of the authenticated session and hands out the
/// signals the UI renders from. Provided as context below `ShowWhenAuthenticated`.
#[derive(Clone)]
pub struct BookService {
    auth: Authenticated,
    store: BookStore,
}

impl BookService {
    pub fn provide(auth: Authenticated) -> Self {
        let epoch = use_asgardeo_auth().epoch();
        let service = Self {
            auth,
            store: BookStore::new(epoch),
        };
        provide_context(service.clone());
        service
    }

    pub fn get() -> Self {
        expect_context::<Self>()
    }

    fn api(&self) -> BookApi {
        BookApi::new(self.auth.gateway())
    }

    pub fn books(&self) -> Signal<Option<Vec<Book>>> {
        self.store.books().into()
    }

    pub fn busy(&self) -> Signal<bool> {
        self.store.busy().into()
    }

    pub fn last_error(&self) -> Signal<Option<String>> {
        self.store.last_error().into()
    }

    pub fn notice(&self) -> Signal<Option<String>> {
        self.store.notice().into()
    }

    pub fn dismiss_error(&self) {
        self.store.dismiss_error();
    }

    pub fn dismiss_notice(&self) {
        self.store.dismiss_notice();
    }

    pub fn refresh(&self) {
        let this = self.clone();
        leptos::task::spawn_local(async move {
            this.store.refresh(&this.api()).await;
        });
    }

    pub fn add(&self, draft: BookDraft) {
        let this = self.clone();
        leptos::task::spawn_local(async move {
            this.store.create(&this.api(), draft).await;
        });
    }

    pub fn remove(&self, id: String) {
        let this = self.clone();
        leptos::task::spawn_local(async move {
            this.store.delete(&this.api(), &id).await;
        });
    }
}

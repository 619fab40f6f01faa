use crate::services::BookService;
use leptos::prelude::*;
use leptos_asgardeo_auth::{use_asgardeo_auth, Authenticated, BookDraft};

#[component]
pub fn Dashboard(auth: Authenticated) -> impl IntoView {
    let session = use_asgardeo_auth();
    let service = BookService::provide(auth);

    // Initial load of the book list.
    service.refresh();

    let books = service.books();
    let busy = service.busy();
    let last_error = service.last_error();
    let notice = service.notice();

    let (title, set_title) = signal(String::new());
    let (author, set_author) = signal(String::new());
    let (isbn, set_isbn) = signal(String::new());

    let on_submit = {
        let service = service.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            service.add(BookDraft {
                title: title.get_untracked(),
                author: author.get_untracked(),
                isbn: Some(isbn.get_untracked()).filter(|it| !it.trim().is_empty()),
            });
            set_title.set(String::new());
            set_author.set(String::new());
            set_isbn.set(String::new());
        }
    };

    let service_for_error = service.clone();
    let service_for_notice = service.clone();
    let service_for_list = service.clone();

    view! {
        <header class="dashboard-header">
            <h1>"Book Manager"</h1>
            <div class="user">
                <span id="display-name">{ move || auth.profile.read().display_name().to_owned() }</span>
                <button id="sign-out" on:click=move |_| session.sign_out()>"Sign out"</button>
            </div>
        </header>

        { move || last_error.get().map(|msg| {
            let service = service_for_error.clone();
            view! {
                <div class="banner banner-error">
                    <span>{ msg }</span>
                    <button on:click=move |_| service.dismiss_error()>"Dismiss"</button>
                </div>
            }
        }) }

        { move || notice.get().map(|msg| {
            let service = service_for_notice.clone();
            view! {
                <div class="banner banner-notice">
                    <span>{ msg }</span>
                    <button on:click=move |_| service.dismiss_notice()>"Dismiss"</button>
                </div>
            }
        }) }

        <form class="add-book" on:submit=on_submit>
            <input
                placeholder="Title"
                prop:value=title
                on:input=move |ev| set_title.set(event_target_value(&ev))
            />
            <input
                placeholder="Author"
                prop:value=author
                on:input=move |ev| set_author.set(event_target_value(&ev))
            />
            <input
                placeholder="ISBN (optional)"
                prop:value=isbn
                on:input=move |ev| set_isbn.set(event_target_value(&ev))
            />
            <button type="submit" disabled=busy>"Add book"</button>
        </form>

        <section class="books">
            { move || match books.get() {
                None => view! { <p class="books-loading">"Loading books..."</p> }.into_any(),
                Some(list) if list.is_empty() => {
                    view! { <p class="books-empty">"No books yet. Add your first one above."</p> }.into_any()
                }
                Some(list) => view! {
                    <ul class="book-list">
                        { list.into_iter().map(|book| {
                            let service = service_for_list.clone();
                            let id = book.id.clone();
                            view! {
                                <li>
                                    <span class="book-title">{ book.title.clone() }</span>
                                    <span class="book-author">{ book.author.clone() }</span>
                                    { book.isbn.clone().map(|isbn| view! {
                                        <span class="book-isbn">{ isbn }</span>
                                    }) }
                                    <button on:click=move |_| service.remove(id.clone())>
                                        "Delete"
                                    </button>
                                </li>
                            }
                        }).collect_view() }
                    </ul>
                }.into_any(),
            } }
        </section>
    }
}

use maud::{html, Markup, DOCTYPE};

use crate::{db::models::AuthUser, names, utils};

const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
const HTMX_JS: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

fn css() -> Markup {
    html! {
        link rel="stylesheet" href=(PICO_CSS);
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        script src=(HTMX_JS) {}
    }
}

fn icon() -> Markup {
    html! {
        link rel="icon" href="/static/img/icon.svg" type="image/svg+xml" {}
    }
}

fn header(user: Option<&AuthUser>) -> Markup {
    html! {
        header {
            nav {
                ul {
                    li."secondary" {
                        a href=(names::HOME_URL) {
                            strong { "Daily Quiz" }
                        }
                    }
                }
                ul {
                    @if let Some(user) = user {
                        li { a href=(names::QUIZ_URL) { "Today's quiz" } }
                        li { a href=(names::HISTORY_URL) { "History" } }
                        @if user.is_admin {
                            li { a href=(names::ADMIN_URL) { "Admin" } }
                        }
                        li {
                            a href="#" hx-post=(names::LOGOUT_URL) { "Log out" }
                        }
                    } @else {
                        li { a href=(names::LOGIN_URL) { "Log in" } }
                        li { a href=(names::SIGNUP_URL) { "Sign up" } }
                    }
                    li."secondary" { (utils::VERSION) }
                }
            }
        }
    }
}

pub fn page(title: &str, body: Markup, user: Option<&AuthUser>) -> Markup {
    html! {
        (DOCTYPE)
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="color-scheme" content="light dark";

            (css())
            (js())
            (icon())

            title { (format!("{title} - Daily Quiz")) }
        }

        body."container" {
            (header(user))
            main { (body) }
        }
    }
}

pub fn titled(title: &str, body: Markup) -> Markup {
    html! {
        title { (title) " - Daily Quiz" }
        (body)
    }
}

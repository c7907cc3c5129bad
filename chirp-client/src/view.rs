//! Markup rendering for the view tree.
//!
//! All text and attribute values go through [`Escaped`], so anything users
//! typed is shown literally.

use crate::{
    composer::{ComposerView, SubmitAffordance},
    feed::{FeedView, PostView},
    loading::LoadingIndicator,
    page::{HeaderView, PageView},
};
use std::fmt::{Display, Formatter, Result};

pub const SIGN_IN_LABEL: &str = "Sign in";
pub const SIGN_OUT_LABEL: &str = "Sign out";
pub const SUBMIT_LABEL: &str = "Post";

/// Something that can be written out as markup.
pub trait Render {
    fn render(&self, f: &mut Formatter<'_>) -> Result;
}

/// Displays a view as markup: `Markup(&view).to_string()`.
pub struct Markup<'a, V: ?Sized>(pub &'a V);

impl<V: Render + ?Sized> Display for Markup<'_, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.0.render(f)
    }
}

/// Text escaped for use in element content and quoted attribute values.
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mut rest = self.0;
        while let Some(index) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..index])?;
            f.write_str(match rest.as_bytes()[index] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            })?;
            rest = &rest[index + 1..];
        }
        f.write_str(rest)
    }
}

fn write_spinner(f: &mut Formatter<'_>, label: &str) -> Result {
    write!(
        f,
        r#"<div class="spinner" role="status"><span class="sr-only">{}</span></div>"#,
        Escaped(label)
    )
}

impl Render for LoadingIndicator {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LoadingIndicator::Inline => write_spinner(f, self.label()),
            LoadingIndicator::FullPage => {
                f.write_str(r#"<div class="loading-page">"#)?;
                write_spinner(f, self.label())?;
                f.write_str("</div>")
            }
        }
    }
}

impl Render for PostView {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        let username = Escaped(self.username.get());
        write!(
            f,
            r#"<div class="post" data-key="{key}"><img class="avatar" src="{avatar}" alt="@{username}'s profile picture">"#,
            key = Escaped(self.key.get()),
            avatar = Escaped(&self.avatar_url),
        )?;
        write!(
            f,
            r#"<div class="post-body"><div class="post-meta"><a href="{profile}"><span>@{username}</span></a><a href="{permalink}"><span class="time"> · {time_ago}</span></a></div>"#,
            profile = Escaped(&self.profile.to_string()),
            permalink = Escaped(&self.permalink.to_string()),
            time_ago = Escaped(&self.time_ago),
        )?;
        write!(
            f,
            r#"<span class="content">{}</span></div></div>"#,
            Escaped(&self.content)
        )
    }
}

impl Render for FeedView {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            FeedView::Loading(indicator) => indicator.render(f),
            FeedView::Failed(message) => {
                write!(f, r#"<div class="feed-error">{}</div>"#, Escaped(message))
            }
            FeedView::Posts(rows) => {
                f.write_str(r#"<div class="feed">"#)?;
                for row in rows {
                    row.render(f)?;
                }
                f.write_str("</div>")
            }
        }
    }
}

impl Render for ComposerView {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            r#"<div class="composer"><img class="avatar" src="{avatar}" alt="Profile image"><input placeholder="{placeholder}" value="{draft}"{disabled}>"#,
            avatar = Escaped(&self.avatar_url),
            placeholder = Escaped(self.placeholder),
            draft = Escaped(&self.draft),
            disabled = if self.input_disabled { " disabled" } else { "" },
        )?;
        match self.submit {
            SubmitAffordance::Button => write!(
                f,
                r#"<button type="submit">{}</button>"#,
                Escaped(SUBMIT_LABEL)
            )?,
            SubmitAffordance::Pending(indicator) => indicator.render(f)?,
            SubmitAffordance::Hidden => {}
        }
        f.write_str("</div>")
    }
}

impl Render for HeaderView {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            HeaderView::SignIn => write!(f, r#"<button class="sign-in">{SIGN_IN_LABEL}</button>"#),
            HeaderView::SignOut => {
                write!(f, r#"<button class="sign-out">{SIGN_OUT_LABEL}</button>"#)
            }
        }
    }
}

impl Render for PageView {
    fn render(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            PageView::Placeholder => f.write_str("<div></div>"),
            PageView::Loaded {
                header,
                composer,
                feed,
            } => {
                f.write_str(r#"<main><div class="header">"#)?;
                header.render(f)?;
                if let Some(composer) = composer {
                    composer.render(f)?;
                }
                f.write_str("</div>")?;
                feed.render(f)?;
                f.write_str("</main>")
            }
        }
    }
}

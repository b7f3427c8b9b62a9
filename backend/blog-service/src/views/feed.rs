use super::layout::{escape_html, time_ago};
use crate::models::PostSummary;
use crate::services::{FeedPager, FeedStatus, RankedPost, SeenPosts};

pub const ALL_LOADED: &str = "Você carregou todos os posts. Parabéns";
const LOADING: &str = "Carregando...";

/// "1 curtiu", "3 curtiram"
pub fn likes_label(score: i64) -> String {
    if score == 1 {
        "1 curtiu".to_string()
    } else {
        format!("{} curtiram", score)
    }
}

fn post_link(post: &PostSummary) -> String {
    format!("/{}/{}", post.author_id, post.id)
}

pub fn post_row(row: &RankedPost) -> String {
    let post = &row.post;
    format!(
        r#"<article class="post-row" id="post-{id}">
  <span class="post-rank">{rank}.</span>
  <div>
    <a href="{href}"><strong>{title}</strong></a>
    <div class="post-meta">{likes} · {comments} comentários · por <a href="/{author_url}">{author}</a> · {ago}</div>
  </div>
</article>"#,
        id = post.id,
        rank = row.rank,
        href = post_link(post),
        title = escape_html(&post.title),
        likes = likes_label(row.score),
        comments = post.comment_count,
        author_url = urlencoding::encode(&post.author_name),
        author = escape_html(&post.author_name),
        ago = time_ago(post.created_at),
    )
}

/// URL the sentinel loads when revealed; `seen` carries the ranked ids
pub fn next_page_url(recents: bool, cursor: &str, seen: &SeenPosts) -> String {
    format!(
        "/feed/page?recents={}&cursor={}&seen={}",
        recents,
        urlencoding::encode(cursor),
        urlencoding::encode(&seen.encode())
    )
}

/// Element at the end of the list. Revealing it fetches the next page and
/// swaps the sentinel for the result; overlapping triggers are dropped.
pub fn sentinel(recents: bool, cursor: &str, seen: &SeenPosts) -> String {
    format!(
        r#"<div class="feed-sentinel" hx-get="{url}" hx-trigger="revealed" hx-swap="outerHTML" hx-sync="this:drop">
  <div class="spinner">{loading}</div>
</div>"#,
        url = escape_html(&next_page_url(recents, cursor, seen)),
        loading = LOADING,
    )
}

fn footer(pager: &FeedPager) -> String {
    match pager.status() {
        FeedStatus::Idle => match pager.next_cursor() {
            Some(cursor) => sentinel(pager.recents(), cursor, &pager.seen_after()),
            None => String::new(),
        },
        FeedStatus::AllLoaded => format!(r#"<p class="all-loaded">{}</p>"#, ALL_LOADED),
        FeedStatus::Loading | FeedStatus::FetchingNextPage => {
            format!(r#"<div class="spinner">{}</div>"#, LOADING)
        }
        FeedStatus::Failed(message) => format!(
            r#"<p class="banner" role="alert">{}</p>"#,
            escape_html(&message)
        ),
    }
}

/// Rows of every page the pager holds followed by its footer. Used both for
/// the first render and for each sentinel swap.
pub fn feed_fragment(pager: &FeedPager) -> String {
    let mut html = String::new();
    for row in pager.ranked_posts() {
        html.push_str(&post_row(&row));
        html.push('\n');
    }
    html.push_str(&footer(pager));
    html
}

pub fn feed_page(pager: &FeedPager) -> String {
    let heading = if pager.recents() {
        "Posts recentes"
    } else {
        "Posts em alta"
    };
    format!(
        r#"<h1>{heading}</h1>
<section id="feed">
{fragment}
</section>"#,
        heading = heading,
        fragment = feed_fragment(pager),
    )
}

/// Profile listing: the author's newest posts, numbered in order
pub fn profile_page(name: &str, posts: &[PostSummary]) -> String {
    let rows = if posts.is_empty() {
        "<p>Nenhum post ainda.</p>".to_string()
    } else {
        posts
            .iter()
            .enumerate()
            .map(|(i, post)| {
                post_row(&RankedPost {
                    rank: i + 1,
                    score: post.score,
                    post: post.clone(),
                })
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<h1>{name}</h1>
<section>
{rows}
</section>"#,
        name = escape_html(name),
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostPage;
    use chrono::Utc;
    use uuid::Uuid;

    fn summary(title: &str, score: i64) -> PostSummary {
        PostSummary {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author_id: Uuid::new_v4(),
            author_name: "ana maria".to_string(),
            score,
            comment_count: 2,
            created_at: Utc::now(),
        }
    }

    fn loaded(items: Vec<PostSummary>, next: Option<&str>) -> FeedPager {
        let mut pager = FeedPager::new(false, 15);
        pager.start();
        pager.receive(PostPage {
            items,
            next_cursor: next.map(str::to_string),
        });
        pager
    }

    #[test]
    fn like_label_is_singular_only_for_one() {
        assert_eq!(likes_label(0), "0 curtiram");
        assert_eq!(likes_label(1), "1 curtiu");
        assert_eq!(likes_label(2), "2 curtiram");
    }

    #[test]
    fn row_links_to_post_and_author() {
        let post = summary("<b>olá</b>", 1);
        let html = post_row(&RankedPost {
            rank: 4,
            score: 1,
            post: post.clone(),
        });
        assert!(html.contains(&format!(r#"href="/{}/{}""#, post.author_id, post.id)));
        assert!(html.contains(r#"href="/ana%20maria""#));
        assert!(html.contains("4."));
        assert!(html.contains("1 curtiu"));
        assert!(html.contains("2 comentários"));
        assert!(html.contains("&lt;b&gt;olá&lt;/b&gt;"));
        assert!(html.contains("atrás"));
    }

    #[test]
    fn idle_feed_ends_with_a_revealed_sentinel() {
        let (a, b) = (summary("a", 0), summary("b", 0));
        let seen = SeenPosts::new(vec![a.id, b.id]);
        let pager = loaded(vec![a, b], Some("abc"));
        let html = feed_fragment(&pager);
        assert!(html.contains(r#"hx-trigger="revealed""#));
        assert!(html.contains(r#"hx-sync="this:drop""#));
        assert!(html.contains(&format!("cursor=abc&amp;seen={}", seen.encode())));
        assert!(!html.contains(ALL_LOADED));
    }

    #[test]
    fn last_page_shows_all_loaded_message() {
        let pager = loaded(vec![summary("a", 0)], None);
        let html = feed_fragment(&pager);
        assert!(html.contains(ALL_LOADED));
        assert!(!html.contains("hx-get"));
    }

    #[test]
    fn failure_is_shown_verbatim() {
        let mut pager = FeedPager::new(true, 15);
        pager.start();
        pager.fail("Falha <ao> carregar");
        let html = feed_fragment(&pager);
        assert!(html.contains("Falha &lt;ao&gt; carregar"));
    }
}

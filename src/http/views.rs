//! HTML rendering for the search form and result pages.

use std::fmt::Write;

use url::form_urlencoded::byte_serialize;

use crate::search::Search;

/// Render the full page. Without a search only the form is shown.
pub fn render_page(search: Option<&Search>) -> String {
    let query = search.map(|s| s.query.as_str()).unwrap_or_default();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Wikipedia Search</title>\n");
    html.push_str("<link rel=\"stylesheet\" href=\"/static/style.css\">\n");
    html.push_str("</head>\n<body>\n<main>\n");
    html.push_str("<header>\n<h1>Wikipedia Search</h1>\n");
    let _ = write!(
        html,
        "<form action=\"/search\" role=\"search\">\n\
         <input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search Wikipedia\" autofocus>\n\
         </form>\n",
        escape(query)
    );
    html.push_str("</header>\n");

    if let Some(search) = search {
        render_results(&mut html, search);
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_results(html: &mut String, search: &Search) {
    let info = &search.results.query.searchinfo;
    let hits = &search.results.query.search;

    html.push_str("<section class=\"results\">\n");
    if hits.is_empty() {
        let _ = writeln!(
            html,
            "<p class=\"summary\">No results found for <strong>{}</strong>.</p>",
            escape(&search.query)
        );
    } else {
        let _ = writeln!(
            html,
            "<p class=\"summary\">About <strong>{}</strong> results. Page {} of {}.</p>",
            info.totalhits,
            search.current_page(),
            search.total_pages
        );
    }

    html.push_str("<ul>\n");
    for item in hits {
        let _ = write!(
            html,
            "<li>\n<h3><a href=\"https://en.wikipedia.org/wiki/{}\" target=\"_blank\" rel=\"noopener\">{}</a></h3>\n\
             <p class=\"snippet\">{}</p>\n\
             <p class=\"meta\">{} words</p>\n</li>\n",
            encode(&item.title.replace(' ', "_")),
            escape(&item.title),
            // Snippets are HTML produced by the search API.
            item.snippet,
            item.wordcount
        );
    }
    html.push_str("</ul>\n");

    if search.total_pages > 1 {
        html.push_str("<nav class=\"pagination\">\n");
        if search.current_page() > 1 {
            let _ = writeln!(
                html,
                "<a class=\"previous\" href=\"/search?q={}&amp;page={}\">&larr; Previous</a>",
                encode(&search.query),
                search.previous_page()
            );
        }
        if !search.is_last_page() {
            let _ = writeln!(
                html,
                "<a class=\"next\" href=\"/search?q={}&amp;page={}\">Next &rarr;</a>",
                encode(&search.query),
                search.next_page
            );
        }
        html.push_str("</nav>\n");
    }
    html.push_str("</section>\n");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn encode(text: &str) -> String {
    byte_serialize(text.as_bytes()).collect()
}

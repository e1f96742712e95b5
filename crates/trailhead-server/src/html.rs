//! Minimal HTML rendering for browser clients of `GET /trips`.

use std::fmt::Write;
use trailhead_trips::Trip;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the trip listing page.
pub fn trips_page(trips: &[Trip]) -> String {
    let mut rows = String::new();
    for trip in trips {
        let photo = match &trip.photo {
            Some(url) => format!("<img src=\"{}\" alt=\"\" width=\"120\">", escape(url)),
            None => String::new(),
        };
        // Writing to a String cannot fail.
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            photo,
            escape(&trip.name),
            escape(trip.description.as_deref().unwrap_or("")),
            escape(&trip.dates),
            escape(&trip.cost),
            trip.number_of_people,
        );
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>Trips</title></head>\n\
         <body>\n\
         <h1>Trips</h1>\n\
         <table>\n\
         <thead><tr><th></th><th>Name</th><th>Description</th><th>Dates</th><th>Cost</th><th>People</th></tr></thead>\n\
         <tbody>\n{}</tbody>\n\
         </table>\n\
         <h2>Add a trip</h2>\n\
         <form method=\"post\" action=\"/trips\">\n\
         <input name=\"name\" placeholder=\"Name\" required>\n\
         <input name=\"dates\" placeholder=\"Dates\" required>\n\
         <input name=\"cost\" placeholder=\"Cost\" required>\n\
         <input name=\"description\" placeholder=\"Description\">\n\
         <button type=\"submit\">Add</button>\n\
         </form>\n\
         </body>\n\
         </html>\n",
        rows
    )
}

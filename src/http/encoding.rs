//! URL percent-encoding helpers
//!
//! Just enough for media ids in paths, listing query strings and
//! `Content-Disposition` file names.

/// Decode `%XX` escapes; `+` stays literal (path semantics)
///
/// Invalid escapes are kept as written and invalid UTF-8 is replaced.
pub fn decode_path_segment(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

/// Decode an `application/x-www-form-urlencoded` component (`+` is a space)
pub fn decode_query_component(raw: &str) -> String {
    decode_path_segment(&raw.replace('+', " "))
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 name
pub fn content_disposition(kind: &str, file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "{kind}; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

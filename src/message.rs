//! Fixed Swedish texts of the warning message.

pub const SUBJECT_TEMPLATE: &str = "OBS! Trångt i mailkorgen - {date}";

pub const BODY_TEMPLATE: &str = "Hej NN\r\n\
\r\n\
Du har ganska mycket e-post lagrat nu.\r\n  \
{usage}\r\n\
Det här meddelandet är automatiskt och skickas ut en gång i veckan. \
Håll dig under {threshold}% så kommer inte dessa mail mer.\r\n\
\r\n\
-- \r\n\
Hälsningar Kaos";

/// Renders a float the way the warning texts always showed them: `40.0`, `84.9`.
pub fn number(value: f64) -> String {
    return format!("{:?}", value);
}

pub fn subject(date: &str) -> String {
    return SUBJECT_TEMPLATE.replace("{date}", date);
}

pub fn body(usage: &str, threshold: f64) -> String {
    return BODY_TEMPLATE
        .replace("{usage}", usage)
        .replace("{threshold}", &number(threshold));
}

/// Turns an area name into a safe file stem: `"Göteborg TMA"` → `"GOTEBORG_TMA"`.
///
/// Accented Latin letters fold to their ASCII base letter, the `ﬁ`-style
/// compatibility ligatures expand, other combining marks are dropped and
/// whitespace runs become one `_`.
///
/// The fold table covers the Latin-1 and Latin Extended-A letters seen in
/// Nordic and European area names. It is not a full NFKD decomposition: a
/// precomposed letter outside the table (e.g. `Ǘ`, `Ḿ`) passes through
/// unchanged. Letters without a decomposition such as `Æ`, `Ø` and `ß` are
/// kept as is and only uppercased (`ß` becomes `SS`).
pub fn clean_file_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if is_combining_mark(c) {
            continue;
        }
        if pending_space {
            cleaned.push('_');
            pending_space = false;
        }
        match fold_to_ascii(c) {
            Some(folded) => cleaned.push_str(folded),
            None => cleaned.push(c),
        }
    }

    cleaned.to_uppercase()
}

/// U+0300..U+036F 組合附加符號
fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

fn fold_to_ascii(c: char) -> Option<&'static str> {
    let folded = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' => "D",
        'ď' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ő' => "o",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' => "S",
        'ś' | 'š' => "s",
        'Ť' => "T",
        'ť' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        // 相容性連字
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        'ﬀ' => "ff",
        'ﬁ' => "fi",
        'ﬂ' => "fl",
        'ﬃ' => "ffi",
        'ﬄ' => "ffl",
        _ => return None,
    };
    Some(folded)
}

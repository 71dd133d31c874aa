//! 纵中横转换：竖排时把夹在和文里的短横排片段转成适合竖排的形式

/// 半角字符 → 全角字符的固定对照表，只覆盖转换对象字符
fn half_to_full(c: char) -> char {
    match c {
        'A' => 'Ａ',
        'B' => 'Ｂ',
        'C' => 'Ｃ',
        'D' => 'Ｄ',
        'E' => 'Ｅ',
        'F' => 'Ｆ',
        'G' => 'Ｇ',
        'H' => 'Ｈ',
        'I' => 'Ｉ',
        'J' => 'Ｊ',
        'K' => 'Ｋ',
        'L' => 'Ｌ',
        'M' => 'Ｍ',
        'N' => 'Ｎ',
        'O' => 'Ｏ',
        'P' => 'Ｐ',
        'Q' => 'Ｑ',
        'R' => 'Ｒ',
        'S' => 'Ｓ',
        'T' => 'Ｔ',
        'U' => 'Ｕ',
        'V' => 'Ｖ',
        'W' => 'Ｗ',
        'X' => 'Ｘ',
        'Y' => 'Ｙ',
        'Z' => 'Ｚ',
        'a' => 'ａ',
        'b' => 'ｂ',
        'c' => 'ｃ',
        'd' => 'ｄ',
        'e' => 'ｅ',
        'f' => 'ｆ',
        'g' => 'ｇ',
        'h' => 'ｈ',
        'i' => 'ｉ',
        'j' => 'ｊ',
        'k' => 'ｋ',
        'l' => 'ｌ',
        'm' => 'ｍ',
        'n' => 'ｎ',
        'o' => 'ｏ',
        'p' => 'ｐ',
        'q' => 'ｑ',
        'r' => 'ｒ',
        's' => 'ｓ',
        't' => 'ｔ',
        'u' => 'ｕ',
        'v' => 'ｖ',
        'w' => 'ｗ',
        'x' => 'ｘ',
        'y' => 'ｙ',
        'z' => 'ｚ',
        '0' => '０',
        '1' => '１',
        '2' => '２',
        '3' => '３',
        '4' => '４',
        '5' => '５',
        '6' => '６',
        '7' => '７',
        '8' => '８',
        '9' => '９',
        '.' => '．',
        ',' => '，',
        '!' => '！',
        '?' => '？',
        '%' => '％',
        _ => c,
    }
}

fn is_convertible(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '!' | '?' | '%')
}

/// 处理一段前后都不挨着其他 ASCII 字节的连续 ASCII 片段。
/// 恰好两位数字的片段套纵中横标记；全部落在可转换字符集内的片段逐字转全角；
/// 其余（夹着空格之类）原样保留。两位数字的判断必须先于全角转换。
fn convert_ascii_run(out: &mut String, run: &str) {
    if run.is_empty() {
        return;
    }
    if run.len() == 2 && run.chars().all(|c| c.is_ascii_digit()) {
        out.push_str("<span class=\"tcy\">");
        out.push_str(run);
        out.push_str("</span>");
    } else if run.chars().all(is_convertible) {
        for c in run.chars() {
            out.push(half_to_full(c));
        }
    } else {
        out.push_str(run);
    }
}

/// 对完成的段落文本做纵中横转换
pub fn tcy(text: &str) -> String {
    let mut converted = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_ascii() {
            run.push(c);
        } else {
            convert_ascii_run(&mut converted, &run);
            run.clear();
            converted.push(c);
        }
    }
    convert_ascii_run(&mut converted, &run);

    // 弯引号换成竖排用的爪括弧
    let converted = converted.replace('“', "〝").replace('”', "〟");
    // 连续的感叹号、疑问号合并成单个合字，全角转换之后才轮到这一步
    converted
        .replace("！？", "<span class=\"tcy\">⁉</span>")
        .replace("？！", "<span class=\"tcy\">⁈</span>")
        .replace("！！", "<span class=\"tcy\">‼</span>")
        .replace("？？", "<span class=\"tcy\">⁇</span>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_digits() {
        assert_eq!("あ<span class=\"tcy\">12</span>い", tcy("あ12い"));
        assert_eq!("<span class=\"tcy\">12</span>", tcy("12"));
    }

    #[test]
    fn test_half_to_full_run() {
        // 两位数字以外的片段逐字转全角
        assert_eq!("あａｂ１２い", tcy("あab12い"));
        assert_eq!("１２３", tcy("123"));
        assert_eq!("ＯＫ？だ", tcy("OK?だ"));
    }

    #[test]
    fn test_run_with_other_ascii_untouched() {
        // 片段里夹着空格时整段不转换
        assert_eq!("a 12 b", tcy("a 12 b"));
        assert_eq!("あ12 bい", tcy("あ12 bい"));
    }

    #[test]
    fn test_quotes() {
        assert_eq!("〝こんにちは〟", tcy("“こんにちは”"));
    }

    #[test]
    fn test_double_punctuation() {
        assert_eq!("すごい<span class=\"tcy\">⁉</span>", tcy("すごい！？"));
        assert_eq!("え<span class=\"tcy\">⁈</span>", tcy("え？！"));
        assert_eq!("行け<span class=\"tcy\">‼</span>", tcy("行け！！"));
        assert_eq!("なぜ<span class=\"tcy\">⁇</span>", tcy("なぜ？？"));
        // 半角の "!?" は全角化を経て合字になる
        assert_eq!("ｗｏｗ<span class=\"tcy\">⁉</span>だ", tcy("wow!?だ"));
    }
}

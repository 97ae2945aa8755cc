// Copyright 2025 The mt-eval Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"([\{-~\[-`\x20-&\(-\+:-@/])").unwrap();
    static ref PERIOD_COMMA_AFTER_NON_DIGIT: Regex = Regex::new(r"([^0-9])([\.,])").unwrap();
    static ref PERIOD_COMMA_BEFORE_NON_DIGIT: Regex = Regex::new(r"([\.,])([^0-9])").unwrap();
    static ref DASH_AFTER_DIGIT: Regex = Regex::new(r"([0-9])(-)").unwrap();
}

/// # mteval-v13a tokenizer
/// The default tokenizer of sacreBLEU, so that scores are comparable with published results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer13a {
    pub lowercase: bool,
}

impl Tokenizer13a {
    pub fn new(lowercase: bool) -> Tokenizer13a {
        Tokenizer13a { lowercase }
    }

    pub fn tokenize(&self, line: &str) -> String {
        let mut line = line
            .replace("<skipped>", "")
            .replace("-\n", "")
            .replace('\n', " ");
        if line.contains('&') {
            line = line
                .replace("&quot;", "\"")
                .replace("&amp;", "&")
                .replace("&lt;", "<")
                .replace("&gt;", ">");
        }
        if self.lowercase {
            line = line.to_lowercase();
        }

        let line = format!(" {} ", line);
        let line = PUNCTUATION.replace_all(&line, " $1 ");
        let line = PERIOD_COMMA_AFTER_NON_DIGIT.replace_all(&line, "$1 $2 ");
        let line = PERIOD_COMMA_BEFORE_NON_DIGIT.replace_all(&line, " $1 $2");
        let line = DASH_AFTER_DIGIT.replace_all(&line, "$1 $2 ");
        line.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    pub fn words(&self, line: &str) -> Vec<String> {
        self.tokenize(line)
            .split(' ')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_punctuation() {
        let tokenizer = Tokenizer13a::default();
        assert_eq!(
            tokenizer.tokenize("Hello, world! (This is \"quoted\".)"),
            "Hello , world ! ( This is \" quoted \" . )"
        );
    }

    #[test]
    fn keeps_numbers_together() {
        let tokenizer = Tokenizer13a::default();
        assert_eq!(tokenizer.tokenize("It costs 3,50 or 1.000."), "It costs 3,50 or 1.000 .");
        assert_eq!(tokenizer.tokenize("pages 10-12"), "pages 10 - 12");
    }

    #[test]
    fn unescapes_entities_and_lowercases() {
        let tokenizer = Tokenizer13a::new(true);
        assert_eq!(tokenizer.tokenize("Tom &amp; Jerry"), "tom & jerry");
        assert_eq!(tokenizer.words("A  B<skipped>"), vec!["a", "b"]);
    }
}

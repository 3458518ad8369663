use crate::config::PostCfg;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use tokenizers::processors::template::TemplateProcessing;

pub fn build_template(
    cfg: &PostCfg,
    special_ids: &HashMap<String, u32>,
) -> Result<TemplateProcessing> {
    for token in [&cfg.cls_token, &cfg.sep_token] {
        if !special_ids.contains_key(token) {
            return Err(Error::Validation(format!(
                "postprocessor requires '{token}' to resolve to a special token id"
            )));
        }
    }

    let mut builder = TemplateProcessing::builder();

    builder
        .try_single(single_sequence_template(cfg))
        .map_err(Error::Validation)?;
    builder
        .try_pair(pair_sequence_template(cfg))
        .map_err(Error::Validation)?;

    let special_tokens = [&cfg.cls_token, &cfg.sep_token]
        .into_iter()
        .map(|token| (token.clone(), special_ids[token]))
        .collect::<Vec<_>>();
    builder.special_tokens(special_tokens);

    builder
        .build()
        .map_err(|err| Error::Validation(err.to_string()))
}

fn single_sequence_template(cfg: &PostCfg) -> Vec<String> {
    vec![
        format!("{}:0", cfg.cls_token),
        "$A:0".to_owned(),
        format!("{}:0", cfg.sep_token),
    ]
}

fn pair_sequence_template(cfg: &PostCfg) -> Vec<String> {
    let mut pieces = single_sequence_template(cfg);

    if cfg.pair_template {
        pieces.push("$B:1".to_owned());
        pieces.push(format!("{}:1", cfg.sep_token));
    } else {
        pieces.push("$B:1".to_owned());
    }

    pieces
}

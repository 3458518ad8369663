use crate::config::{ModelCfg, NormalizerCfg};
use tokenizers::decoders::wordpiece::WordPiece as WordPieceDecoder;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;

pub fn build_normalizer(cfg: &NormalizerCfg) -> BertNormalizer {
    BertNormalizer::new(
        cfg.clean_text,
        cfg.handle_chinese_chars,
        cfg.strip_accents,
        cfg.lowercase,
    )
}

pub fn build_pre_tokenizer() -> BertPreTokenizer {
    BertPreTokenizer
}

pub fn build_decoder(model: &ModelCfg) -> WordPieceDecoder {
    WordPieceDecoder::new(model.continuing_subword_prefix.clone(), true)
}

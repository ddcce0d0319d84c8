use zframe::{compressor, decompressor, frame_info, AttachMode, Compressor, Decompressor, Dictionary, Error, FlushMode};

fn samples() -> Vec<Vec<u8>> {
    (0..300).map(|idx| {
        format!("user_id={idx} name=user{} email=user{}@example.com role={} active={} score={}\n", idx % 17, idx % 23, ["admin", "guest", "member"][idx % 3], idx % 2 == 0, idx * 7 % 101).into_bytes()
    }).collect()
}

fn trained() -> Dictionary {
    Dictionary::train(&samples(), 3072).expect("to train dictionary")
}

#[test]
fn should_train_dictionary() {
    let dictionary = trained();
    assert!(dictionary.len() <= 3072);
    assert_ne!(dictionary.id(), 0);
    assert_eq!(dictionary.mode(), AttachMode::Digested);
    assert!(!dictionary.is_raw());

    let data = vec![b'a'; 345];
    let compressed = compressor::compress(&data, None, Some(&dictionary)).expect("to compress");
    let info = frame_info(&compressed).expect("to read header");
    assert_eq!(info.dictionary_id, dictionary.id());
    assert_eq!(info.decompressed_size, Some(345));
    assert_eq!(decompressor::decompress(&compressed, Some(&dictionary), None).expect("to decompress"), data);
}

#[test]
fn should_reject_invalid_training_arguments() {
    let samples = samples();
    assert!(matches!(Dictionary::train(&samples, 0).unwrap_err(), Error::InvalidArgument(_)));
    let empty: [&[u8]; 0] = [];
    assert!(matches!(Dictionary::train(&empty, 1024).unwrap_err(), Error::InvalidArgument(_)));
}

#[test]
fn should_improve_compression_with_dictionary() {
    let dictionary = trained();
    let data = b"user_id=301 name=user12 email=user2@example.com role=guest active=false score=82\n";

    let plain = compressor::compress(data, Some(3), None).expect("to compress");
    let with_dictionary = compressor::compress(data, Some(3), Some(&dictionary)).expect("to compress");
    assert!(with_dictionary.len() < plain.len(), "{} >= {}", with_dictionary.len(), plain.len());

    let error = decompressor::decompress(&with_dictionary, None, None).unwrap_err();
    assert!(error.is_data());
}

#[test]
fn should_attach_all_modes() {
    let dictionary = trained();
    let data = b"user_id=999 name=user1 email=user1@example.com role=admin active=true score=5\n";

    for view in [dictionary.as_digested(), dictionary.as_undigested(), dictionary.as_prefix()] {
        assert_eq!(view, view.clone());
        assert_eq!(view.content(), dictionary.content());

        let compressed = compressor::compress(data, None, Some(&view)).expect("to compress");
        let info = frame_info(&compressed).expect("to read header");
        match view.mode() {
            AttachMode::Prefix => assert_eq!(info.dictionary_id, 0),
            _ => assert_eq!(info.dictionary_id, dictionary.id()),
        }

        let mut decompressor = Decompressor::new(Some(view.clone()), None).expect("to create decompressor");
        assert_eq!(decompressor.decompress(&compressed, None).expect("to decompress"), data);
    }
}

#[test]
fn should_apply_prefix_to_first_frame_only() {
    let prefix = Dictionary::new(vec![b'x'; 1024], true, AttachMode::Prefix).expect("to create prefix");
    assert_eq!(prefix.id(), 0);

    let mut compressor = Compressor::new(None, Some(prefix.clone()), None).expect("to create compressor");
    let first = compressor.compress(&[b'x'; 512], FlushMode::FlushFrame).expect("to compress");
    let second = compressor.compress(&[b'x'; 512], FlushMode::FlushFrame).expect("to compress");

    let mut decompressor = Decompressor::new(Some(prefix), None).expect("to create decompressor");
    assert_eq!(decompressor.decompress(&first, None).expect("to decompress"), [b'x'; 512]);
    //Second frame was compressed without prefix.
    assert_eq!(decompressor::decompress(&second, None, None).expect("to decompress"), [b'x'; 512]);
}

#[test]
fn should_load_raw_content() {
    let content = b"the same words repeated, the same words repeated, the same words repeated".to_vec();
    let dictionary = Dictionary::new(content.clone(), true, AttachMode::Undigested).expect("to create dictionary");
    assert!(dictionary.is_raw());
    assert_eq!(dictionary.id(), 0);
    assert_eq!(dictionary.to_string(), format!("<Dictionary id=0 size={}>", content.len()));

    let compressed = compressor::compress(b"the same words repeated", None, Some(&dictionary)).expect("to compress");
    assert_eq!(decompressor::decompress(&compressed, Some(&dictionary), None).expect("to decompress"), b"the same words repeated");

    let error = Dictionary::new(content, false, AttachMode::Digested).unwrap_err();
    assert!(matches!(error, Error::InvalidDictionary(_)));
}

#[test]
fn should_finalize_dictionary() {
    if zframe::version_number() < 10405 {
        return;
    }

    let base = Dictionary::new(samples()[..25].concat(), true, AttachMode::Digested).expect("to create base");
    let dictionary = Dictionary::finalize(&base, &samples(), 4096, 5).expect("to finalize");
    assert_ne!(dictionary.id(), 0);
    assert!(dictionary.len() <= 4096);

    let data = b"user_id=7 name=user7 email=user7@example.com role=member active=false score=49\n";
    let compressed = compressor::compress(data, Some(5), Some(&dictionary)).expect("to compress");
    assert_eq!(decompressor::decompress(&compressed, Some(&dictionary), None).expect("to decompress"), data);
}

#[test]
fn should_share_dictionary_between_threads() {
    let dictionary = trained();
    let handles = (0..4).map(|idx| {
        let dictionary = dictionary.clone();
        std::thread::spawn(move || {
            let data = format!("user_id={idx} name=user{idx} email=user{idx}@example.com role=admin active=true score={idx}\n");
            let compressed = compressor::compress(data.as_bytes(), Some(idx + 1), Some(&dictionary)).expect("to compress");
            let output = decompressor::decompress(&compressed, Some(&dictionary), None).expect("to decompress");
            assert_eq!(output, data.as_bytes());
        })
    }).collect::<Vec<_>>();

    for handle in handles {
        handle.join().expect("to join");
    }
}

mod common;

use common::request;
use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use prost_types::field_descriptor_proto::Type;
use proptest::prelude::*;
use protoc_gen_graphql::descriptor::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    ServiceDescriptorProto,
};
use protoc_gen_graphql::graphql::GraphqlField;
use protoc_gen_graphql::{respond_to_bytes, Generator};

fn scalar_kind() -> impl Strategy<Value = (Type, &'static str)> {
    prop::sample::select(vec![
        (Type::Double, "Float"),
        (Type::Float, "Float"),
        (Type::Int32, "Int"),
        (Type::Int64, "Int"),
        (Type::Uint32, "Int"),
        (Type::Uint64, "Int"),
        (Type::Sint32, "Int"),
        (Type::Sint64, "Int"),
        (Type::Fixed32, "Int"),
        (Type::Fixed64, "Int"),
        (Type::Sfixed32, "Int"),
        (Type::Sfixed64, "Int"),
        (Type::Bool, "Boolean"),
        (Type::String, "String"),
        (Type::Bytes, "String"),
    ])
}

fn sample_file(kind: Type, repeated: bool, required: bool) -> FileDescriptorProto {
    let mut field = FieldDescriptorProto::scalar("value", 1, kind).with_options(GraphqlField {
        required,
        ..Default::default()
    });
    if repeated {
        field = field.repeated();
    }

    FileDescriptorProto::new("sample.proto", "sample")
        .with_message(DescriptorProto::new("Sample").with_field(field))
        .with_service(ServiceDescriptorProto::new("Sampler").with_method(
            MethodDescriptorProto::new("Sample", ".sample.Sample", ".sample.Sample").as_query(),
        ))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_scalar_fields_render_the_same_in_every_context(
        (kind, scalar) in scalar_kind(),
        repeated in any::<bool>(),
        required in any::<bool>(),
    ) {
        let roots = Generator::default()
            .build(&request(vec![sample_file(kind, repeated, required)], &["sample.proto"], None))
            .unwrap();
        let root = &roots[0];

        let mut expected = scalar.to_string();
        if repeated {
            expected = format!("[{expected}]");
        }
        if required {
            expected.push('!');
        }

        let output = &root.object("Sample").unwrap().fields[0];
        let input = &root.input("SampleInput").unwrap().fields[0];
        let argument = &root.queries[0].args[0];

        prop_assert_eq!(output.ty.to_string(), expected.clone());
        prop_assert_eq!(input.ty.to_string(), expected.clone());
        prop_assert_eq!(argument.ty.to_string(), expected);
    }

    #[test]
    fn test_arbitrary_input_always_gets_a_response(
        input in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let bytes = respond_to_bytes(&input).unwrap();
        let response = CodeGeneratorResponse::decode(bytes.as_slice());
        prop_assert!(response.is_ok());

        // Anything that decodes as a request with nothing to generate yields an
        // empty success; everything else fails without partial output.
        let response = response.unwrap();
        if response.error.is_some() {
            prop_assert!(response.file.is_empty());
        }
    }
}
